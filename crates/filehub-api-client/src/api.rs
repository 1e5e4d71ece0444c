//! Domain methods for the file service.
//!
//! `ApiClient` implements `FileService`, which is what the sync engine drives.

use async_trait::async_trait;
use bytes::Bytes;
use filehub_core::models::{
    Application, ApplicationId, CreateApplicationRequest, CreateLocationRequest, FilterSet,
    HealthStatus, Location, ServerConfig, ShareRequest, Upload, UploadId, UploadReceipt,
    UploadRequest,
};
use filehub_core::{ClientError, FileService, User};

use crate::ApiClient;

pub mod endpoints {
    pub const CONFIG: &str = "/config";
    pub const APPLICATIONS: &str = "/applications";
    pub const UPLOAD: &str = "/upload";
    pub const UPLOADS: &str = "/uploads";
    pub const SHARE: &str = "/share";
    pub const DOWNLOAD: &str = "/download";
    pub const HEALTH: &str = "/health";

    pub fn application_locations(application_id: i64) -> String {
        format!("{}/{}/locations", APPLICATIONS, application_id)
    }
}

#[async_trait]
impl FileService for ApiClient {
    async fn server_config(&self, user: &User) -> Result<ServerConfig, ClientError> {
        self.get(endpoints::CONFIG, Some(user), &[]).await
    }

    async fn list_applications(&self, user: &User) -> Result<Vec<Application>, ClientError> {
        self.get(endpoints::APPLICATIONS, Some(user), &[]).await
    }

    async fn create_application(
        &self,
        user: &User,
        request: &CreateApplicationRequest,
    ) -> Result<Application, ClientError> {
        self.post_json(endpoints::APPLICATIONS, Some(user), request)
            .await
    }

    async fn list_locations(
        &self,
        user: &User,
        application_id: ApplicationId,
    ) -> Result<Vec<Location>, ClientError> {
        self.get(
            &endpoints::application_locations(application_id),
            Some(user),
            &[],
        )
        .await
    }

    async fn create_location(
        &self,
        user: &User,
        application_id: ApplicationId,
        request: &CreateLocationRequest,
    ) -> Result<Location, ClientError> {
        self.post_json(
            &endpoints::application_locations(application_id),
            Some(user),
            request,
        )
        .await
    }

    async fn upload(
        &self,
        user: &User,
        request: UploadRequest,
    ) -> Result<UploadReceipt, ClientError> {
        let UploadRequest {
            filename,
            content,
            application_id,
            location_id,
            additional_path,
        } = request;

        tracing::debug!(
            filename = %filename,
            size = content.len(),
            application_id,
            location_id,
            "Uploading file"
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(content.to_vec()).file_name(filename),
            )
            .text("application_id", application_id.to_string())
            .text("location_id", location_id.to_string());

        if let Some(path) = normalize_additional_path(additional_path) {
            form = form.text("additional_path", path);
        }

        self.post_multipart(endpoints::UPLOAD, Some(user), form)
            .await
    }

    async fn list_uploads(
        &self,
        user: &User,
        filters: &FilterSet,
    ) -> Result<Vec<Upload>, ClientError> {
        self.get(endpoints::UPLOADS, Some(user), &filters.to_query_pairs())
            .await
    }

    async fn share(
        &self,
        user: &User,
        upload_id: UploadId,
        request: &ShareRequest,
    ) -> Result<Option<String>, ClientError> {
        self.post_json_status(
            &format!("{}/{}", endpoints::SHARE, upload_id),
            Some(user),
            request,
        )
        .await
    }

    async fn download(&self, user: &User, filename: &str) -> Result<Bytes, ClientError> {
        self.get_bytes(
            &format!("{}/{}", endpoints::DOWNLOAD, urlencoding::encode(filename)),
            Some(user),
        )
        .await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get(endpoints::HEALTH, None, &[]).await
    }
}

/// Optional sub-path under the location; blank input means "none".
fn normalize_additional_path(path: Option<String>) -> Option<String> {
    path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn user() -> User {
        User::from_user_name("jdoe")
    }

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_applications_sends_identity_and_unwraps_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/applications")
            .match_header("x-user-id", "jdoe")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","data":[{"id":1,"name":"payroll"},{"id":2,"name":"hr"}]}"#)
            .create_async()
            .await;

        let apps = client(&server).list_applications(&user()).await.unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[1].name, "hr");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_envelope_becomes_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/applications")
            .match_body(Matcher::Json(serde_json::json!({ "name": "payroll" })))
            .with_status(200)
            .with_body(r#"{"status":"error","message":"Application already exists"}"#)
            .create_async()
            .await;

        let request = CreateApplicationRequest::new("payroll").unwrap();
        let err = client(&server)
            .create_application(&user(), &request)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Application already exists");
    }

    #[tokio::test]
    async fn non_success_status_uses_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/applications/3/locations")
            .with_status(422)
            .with_body(r#"{"status":"error","message":"Path is not reachable"}"#)
            .create_async()
            .await;

        let request = CreateLocationRequest::new("inbox", "/srv/inbox").unwrap();
        match client(&server)
            .create_location(&user(), 3, &request)
            .await
            .unwrap_err()
        {
            ClientError::Server { status, message } => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "Path is not reachable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_success_status_without_body_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/applications/3/locations")
            .with_status(500)
            .create_async()
            .await;

        let err = client(&server)
            .list_locations(&user(), 3)
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            filehub_core::error::GENERIC_SERVER_MESSAGE
        );
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/uploads")
            .with_status(401)
            .create_async()
            .await;

        let err = client(&server)
            .list_uploads(&user(), &FilterSet::default())
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn list_uploads_omits_unset_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/uploads")
            .match_query(Matcher::Exact("search=invoice&application_id=4".to_string()))
            .with_status(200)
            .with_body(r#"{"status":"success","data":[]}"#)
            .create_async()
            .await;

        let filters = FilterSet {
            search: Some("invoice".to_string()),
            application_id: Some(4),
            ..Default::default()
        };
        let uploads = client(&server)
            .list_uploads(&user(), &filters)
            .await
            .unwrap();
        assert!(uploads.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_sends_multipart_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header("x-user-id", "jdoe")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="report.pdf""#.to_string()),
                Matcher::Regex(r#"name="application_id""#.to_string()),
                Matcher::Regex(r#"name="location_id""#.to_string()),
                Matcher::Regex(r#"name="additional_path""#.to_string()),
                Matcher::Regex("2024/q1".to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"upload_id":42,"filename":"report.pdf","size":5,"upload_time":"2024-03-05 10:15:00","file_location":"/srv/finance/2024/q1/report.pdf"}}"#,
            )
            .create_async()
            .await;

        let receipt = client(&server)
            .upload(
                &user(),
                UploadRequest {
                    filename: "report.pdf".to_string(),
                    content: Bytes::from_static(b"%PDF-"),
                    application_id: 1,
                    location_id: 2,
                    additional_path: Some("2024/q1".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.upload_id, 42);
        mock.assert_async().await;
    }

    #[test]
    fn blank_additional_path_is_dropped() {
        assert_eq!(normalize_additional_path(Some("   ".to_string())), None);
        assert_eq!(normalize_additional_path(None), None);
        assert_eq!(
            normalize_additional_path(Some(" 2024/q1 ".to_string())).as_deref(),
            Some("2024/q1")
        );
    }

    #[tokio::test]
    async fn share_posts_recipient() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/share/7")
            .match_body(Matcher::Json(serde_json::json!({ "shared_with": "asmith" })))
            .with_status(200)
            .with_body(r#"{"status":"success","message":"File shared with asmith"}"#)
            .create_async()
            .await;

        let message = client(&server)
            .share(
                &user(),
                7,
                &ShareRequest {
                    shared_with: "asmith".to_string(),
                    send_email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("File shared with asmith"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_encodes_filename_and_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/download/q1%20report.pdf")
            .with_status(200)
            .with_body("binary-content")
            .create_async()
            .await;

        let body = client(&server)
            .download(&user(), "q1 report.pdf")
            .await
            .unwrap();
        assert_eq!(&body[..], b"binary-content");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn health_is_fetched_without_identity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .match_header("x-user-id", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"server":"running","debug_mode":false}}"#)
            .create_async()
            .await;

        let health = client(&server).health().await.unwrap();
        assert!(health.is_running());
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:1".to_string(), Duration::from_secs(2))
            .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Timelike;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::{
    entity::feedback,
    error::FeedbackError,
    feedback::{FeedbackService, Submission},
    views,
};

/// One record as served by `/api/feedback`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackJson {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub rating: i64,
    pub comments: Option<String>,
    pub date_submitted: String,
}
impl From<feedback::Model> for FeedbackJson {
    fn from(f: feedback::Model) -> Self {
        // microseconds only when present, no offset
        let date = f.date_submitted.naive_utc();
        let date_submitted = if date.nanosecond() / 1_000 == 0 {
            date.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            date.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        };

        FeedbackJson {
            id: f.id,
            name: f.name,
            email: f.email,
            rating: f.rating,
            comments: f.comments,
            date_submitted,
        }
    }
}

pub fn router(service: FeedbackService) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/submit-feedback", post(submit_feedback))
        .route("/admin-dashboard", get(admin_dashboard))
        .route("/api/feedback", get(api_feedback))
        .route("/export-csv", get(export_csv))
        .route(views::SCRIPT_PATH, get(script))
        .with_state(service)
}

pub async fn serve(addr: SocketAddr, service: FeedbackService) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        "listening on http://{}",
        listener.local_addr().context("failed to read local address")?
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn home() -> Html<String> {
    debug!("GET /");
    Html(views::index())
}

async fn submit_feedback(
    State(service): State<FeedbackService>,
    Form(submission): Form<Submission>,
) -> Redirect {
    debug!("POST /submit-feedback");
    match service.submit(submission).await {
        Ok(saved) => info!("feedback saved: {} (id {})", saved.name, saved.id),
        Err(FeedbackError::Validation(reason)) => warn!("feedback dropped: {}", reason),
        Err(err) => error!("failed to save feedback: {}", err),
    }
    Redirect::to("/")
}

async fn admin_dashboard(State(service): State<FeedbackService>) -> Response {
    debug!("GET /admin-dashboard");
    match service.dashboard_summary().await {
        Ok(summary) => Html(views::dashboard(&summary)).into_response(),
        Err(err) => {
            error!("dashboard error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
                "Error loading dashboard",
            )
                .into_response()
        }
    }
}

async fn api_feedback(State(service): State<FeedbackService>) -> Response {
    debug!("GET /api/feedback");
    match service.list_all().await {
        Ok(records) => Json(
            records
                .into_iter()
                .map(FeedbackJson::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => internal_error("failed to list feedback", err),
    }
}

async fn export_csv(State(service): State<FeedbackService>) -> Response {
    debug!("GET /export-csv");
    match service.export_csv().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV.as_ref()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"feedback.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => internal_error("failed to export feedback", err),
    }
}

async fn script() -> Response {
    (
        [(
            header::CONTENT_TYPE,
            mime::APPLICATION_JAVASCRIPT_UTF_8.as_ref(),
        )],
        views::SCRIPT,
    )
        .into_response()
}

fn internal_error(what: &str, err: FeedbackError) -> Response {
    error!("{}: {}", what, err);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::database;

    async fn app() -> (Router, FeedbackService) {
        let service = FeedbackService::new(database::memory().await);
        (router(service.clone()), service)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit-feedback")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn home_serves_form() {
        let (app, _) = app().await;
        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("/submit-feedback"));
    }

    #[tokio::test]
    async fn submit_then_read_everywhere() {
        let (app, _) = app().await;

        let response = app
            .clone()
            .oneshot(form_request(
                "name=Alice&email=a%40x.com&rating=5&comments=great",
            ))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = app.clone().oneshot(get_request("/api/feedback")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Alice");
        assert_eq!(items[0]["email"], "a@x.com");
        assert_eq!(items[0]["rating"], 5);
        assert_eq!(items[0]["comments"], "great");
        assert!(items[0]["date_submitted"].as_str().unwrap().contains('T'));

        let response = app.oneshot(get_request("/export-csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"feedback.csv\""
        );
        let csv = body_string(response).await;
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with(&format!(
            "{},Alice,a@x.com,5,great,",
            items[0]["id"]
        )));
    }

    #[tokio::test]
    async fn invalid_submission_redirects_without_saving() {
        let (app, service) = app().await;

        for body in [
            "name=&email=b%40x.com&rating=3",
            "email=b%40x.com&rating=3",
            "name=Bob&email=b%40x.com&rating=three",
        ] {
            let response = app.clone().oneshot(form_request(body)).await.unwrap();
            assert!(response.status().is_redirection());
            assert_eq!(response.headers()[header::LOCATION], "/");
        }

        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_shows_summary() {
        let (app, service) = app().await;
        for rating in ["5", "5", "3"] {
            service
                .submit(Submission {
                    name: "A".to_string(),
                    email: "a@x.com".to_string(),
                    rating: rating.to_string(),
                    comments: String::new(),
                })
                .await
                .unwrap();
        }

        let response = app.oneshot(get_request("/admin-dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Total feedback: <strong>3</strong>"));
        assert!(html.contains("Average rating: <strong>4.33</strong>"));
        assert!(html.contains("<li>3 stars: 1</li>"));
        assert!(html.contains("<li>5 stars: 2</li>"));
    }

    #[tokio::test]
    async fn dashboard_storage_failure_is_500() {
        let (app, service) = app().await;
        service.db().clone().close().await.unwrap();

        let response = app.oneshot(get_request("/admin-dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Error loading dashboard");
    }

    #[tokio::test]
    async fn storage_failure_on_submit_redirects_home() {
        let (app, service) = app().await;
        service.db().clone().close().await.unwrap();

        let response = app
            .oneshot(form_request("name=Alice&email=a%40x.com&rating=5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn storage_failure_on_reads_is_500() {
        let (app, service) = app().await;
        service.db().clone().close().await.unwrap();

        for uri in ["/api/feedback", "/export-csv"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        }
    }

    #[tokio::test]
    async fn missing_comments_are_served_as_empty_string() {
        let (app, _) = app().await;

        let response = app
            .clone()
            .oneshot(form_request("name=Bob&email=b%40x.com&rating=4"))
            .await
            .unwrap();
        assert!(response.status().is_redirection());

        let response = app.oneshot(get_request("/api/feedback")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json[0]["name"], "Bob");
        assert_eq!(json[0]["comments"], "");
    }

    #[tokio::test]
    async fn script_is_served() {
        let (app, _) = app().await;
        let response = app.oneshot(get_request(views::SCRIPT_PATH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("validateForm"));
    }

    #[test]
    fn json_dates_are_naive_iso8601() {
        use chrono::{TimeZone, Utc};

        let mut model = feedback::Model {
            id: 1,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            rating: 3,
            comments: None,
            date_submitted: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        };
        assert_eq!(
            FeedbackJson::from(model.clone()).date_submitted,
            "2024-05-06T07:08:09"
        );

        model.date_submitted = model.date_submitted + chrono::Duration::microseconds(1_500);
        let json = FeedbackJson::from(model);
        assert_eq!(json.date_submitted, "2024-05-06T07:08:09.001500");
        assert_eq!(json.comments, None);
    }
}

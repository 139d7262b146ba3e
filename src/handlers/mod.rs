//! 핸들러 모듈

pub mod error;
pub mod form;
pub mod room;
pub mod strokes;

pub use room::*;
pub use strokes::*;

#[cfg(test)]
mod tests {
    use crate::config::{CanvasConfig, Config, RoomConfig};
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app(image_dir: &Path) -> Router {
        let config = Config {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_origins: vec!["*".to_string()],
            site_dir: image_dir.join("site"),
            room: RoomConfig {
                ttl: Duration::from_secs(3600),
                sweep_interval: Duration::from_secs(3600),
            },
            canvas: CanvasConfig {
                image_dir: image_dir.to_path_buf(),
                max_image_pixels: 1 << 20,
                max_body_bytes: 1 << 20,
            },
            log_level: "info".to_string(),
        };
        crate::app(Arc::new(AppState::new(config)))
    }

    fn form(uri: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn png_data_url(width: u32, height: u32, pixel: [u8; 4]) -> String {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba(pixel))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        // '+' 와 '/' 는 폼 인코딩에서 이스케이프 필요
        let encoded = BASE64
            .encode(bytes)
            .replace('+', "%2B")
            .replace('/', "%2F")
            .replace('=', "%3D");
        format!("data:image/png;base64,{}", encoded)
    }

    async fn json(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn create(app: &Router, num: u8) -> (u32, Vec<u32>) {
        let (status, body) = json(app, form("/api/create_room", format!("num={}", num))).await;
        assert_eq!(status, StatusCode::OK);
        let mut ids: Vec<u32> = serde_json::from_value(body).unwrap();
        assert_eq!(ids.len(), usize::from(num) + 1);
        let room_id = ids.pop().unwrap();
        (room_id, ids)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_room_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let (room_id, uids) = create(&app, 3).await;

        let (status, config) = json(
            &app,
            form("/api/get_config", format!("id={}&uid={}", room_id, uids[0])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["Submitted"], false);
        assert_eq!(config["Uc"]["ink"], 80000.0);
        assert!(config["Rc"]["bg"].as_str().unwrap().starts_with("hsl("));

        let img = png_data_url(4, 4, [10, 20, 30, 255]);
        let submit = |uid: u32, img: &str| {
            form(
                "/api/send_strokes",
                format!("id={}&uid={}&img={}", room_id, uid, img),
            )
        };

        let (status, _) = json(&app, submit(uids[0], &img)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(dir.path().join(format!("{}.png", room_id)).exists());

        let (status, _) = json(&app, submit(uids[0], &img)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = json(&app, submit(uids[1], &png_data_url(2, 2, [0, 0, 0, 255]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, done) = json(
            &app,
            form("/api/get_done", format!("id={}&uid={}", room_id, uids[0])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done, serde_json::json!([1, 3, 1]));

        let (_, done) = json(
            &app,
            form("/api/get_done", format!("id={}&uid={}", room_id, uids[2])),
        )
        .await;
        assert_eq!(done, serde_json::json!([1, 3, 0]));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let (room_id, uids) = create(&app, 1).await;

        for body in ["", "num=0", "num=256", "num=abc"] {
            let (status, _) = json(&app, form("/api/create_room", body.to_string())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        }

        let (status, _) = json(
            &app,
            form("/api/get_done", format!("id={}&uid={}", room_id, uids[0].wrapping_add(1))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = json(
            &app,
            form("/api/get_config", format!("id={}", room_id)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = json(
            &app,
            form(
                "/api/send_strokes",
                format!("id={}&uid={}&img=hello", room_id, uids[0]),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_single_player_config() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (status, config) = json(&app, form("/api/get_config", String::new())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["Submitted"], false);
        assert_eq!(config["Uc"]["ink"], 240000.0);
    }

    #[tokio::test]
    async fn test_multipart_create_room() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let body = "--XyZ\r\n\
                    Content-Disposition: form-data; name=\"num\"\r\n\r\n\
                    2\r\n\
                    --XyZ--\r\n";
        let req = Request::post("/api/create_room")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
            .body(Body::from(body))
            .unwrap();

        let (status, ids) = json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        create(&app, 2).await;

        let req = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rooms"], 1);
    }
}

mod common;

use anyhow::Result;
use campus_gate::auth::{issue_role_token, RoleClaims};
use reqwest::{header, StatusCode};

fn role_cookie(role: &str) -> String {
    let token = issue_role_token(&RoleClaims::new("tester", role, 1), common::TEST_SECRET)
        .expect("failed to issue role token");
    format!("token=session-abc; role={}", token)
}

async fn get(path: &str, cookie: Option<&str>) -> Result<reqwest::Response> {
    let server = common::ensure_server().await?;
    let mut req = common::client().get(format!("{}{}", server.base_url, path));
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    Ok(req.send().await?)
}

fn location(res: &reqwest::Response) -> Option<&str> {
    res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn anonymous_dashboard_request_redirects_to_entry_point() -> Result<()> {
    let res = get("/dashboard/cursos/123", None).await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), Some("/"));
    Ok(())
}

#[tokio::test]
async fn anonymous_admin_request_redirects_to_entry_point_even_with_role() -> Result<()> {
    let cookie = role_cookie("ADMIN").replace("token=session-abc; ", "");
    let res = get("/dashboard/admin/usuarios", Some(&cookie)).await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), Some("/"));
    Ok(())
}

#[tokio::test]
async fn authenticated_dashboard_request_passes() -> Result<()> {
    let res = get("/dashboard/cursos/123", Some("token=session-abc")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["area"], "protected");
    Ok(())
}

#[tokio::test]
async fn coordinator_reaches_admin_area() -> Result<()> {
    let res = get("/dashboard/admin/salones", Some(&role_cookie("coordinador"))).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["area"], "admin");
    Ok(())
}

#[tokio::test]
async fn teacher_is_sent_to_landing_page() -> Result<()> {
    let res = get("/dashboard/admin/salones", Some(&role_cookie("docente"))).await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), Some("/dashboard"));
    Ok(())
}

#[tokio::test]
async fn unsigned_admin_role_cookie_does_not_unlock_admin_area() -> Result<()> {
    let res = get("/dashboard/admin", Some("token=session-abc; role=ADMIN")).await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), Some("/dashboard"));
    Ok(())
}

#[tokio::test]
async fn unknown_public_path_is_not_gated() -> Result<()> {
    let res = get("/horarios-publicos", None).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

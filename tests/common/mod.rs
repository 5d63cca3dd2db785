#![allow(dead_code)]

use std::{io::Cursor, str::FromStr};

use dojo::{
    config::Settings,
    domain::{CreateMemberRequest, MemberDetails},
    service::ServiceContext,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// In-memory database with migrations applied. A single connection keeps
/// every query on the same database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    dojo::db::migrate(&pool).await?;
    Ok(pool)
}

pub async fn test_context() -> anyhow::Result<ServiceContext> {
    test_context_with(|_| {}).await
}

pub async fn test_context_with(configure: impl FnOnce(&mut Settings)) -> anyhow::Result<ServiceContext> {
    let mut settings = Settings::default();
    configure(&mut settings);
    Ok(ServiceContext::new(test_pool().await?, &settings))
}

pub fn details(id: &str, name: &str, dues_plan: &str) -> MemberDetails {
    MemberDetails {
        id: id.to_string(),
        name: name.to_string(),
        dues_plan: dues_plan.to_string(),
        ..Default::default()
    }
}

pub fn new_member(id: &str, name: &str, dues_plan: &str) -> CreateMemberRequest {
    CreateMemberRequest {
        details: details(id, name, dues_plan),
        photo: None,
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40])));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode test png");
    bytes.into_inner()
}

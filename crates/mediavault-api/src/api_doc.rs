//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::handlers::file_upload::RenameFileRequest;
use crate::handlers::health::HealthResponse;
use crate::handlers::video::VideoDetailResponse;
use crate::handlers::video_upload::VideoUploadResponse;
use mediavault_core::models::{FileResponse, ThumbnailResponse, VideoResponse};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::video_upload::upload_video,
        crate::handlers::video::list_videos,
        crate::handlers::video::get_video,
        crate::handlers::video::delete_video,
        crate::handlers::thumbnail::regenerate_thumbnail,
        crate::handlers::thumbnail::upload_thumbnail,
        crate::handlers::thumbnail::get_thumbnail,
        crate::handlers::file_upload::upload_file,
        crate::handlers::file_upload::list_files,
        crate::handlers::file_upload::rename_file,
        crate::handlers::file_upload::delete_file,
        crate::handlers::file_stream::download_file,
        crate::handlers::file_stream::stream_file,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        FileResponse,
        VideoResponse,
        VideoDetailResponse,
        VideoUploadResponse,
        ThumbnailResponse,
        RenameFileRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "videos", description = "Video upload and management"),
        (name = "thumbnails", description = "Video thumbnails"),
        (name = "files", description = "File storage and streaming"),
    )
)]
pub struct ApiDoc;

use actix_web::{HttpRequest, HttpResponse, get, http::header, post, web};
use log::info;

use super::models::{
    AppState, BlockCreatedResponse, MiningInfo, SupportedTypesResponse, UploadQuery,
};
use super::{caller_id, run_blocking};
use crate::error::Result;
use crate::service::{ALLOWED_MIME_TYPES, FileUpload};

/// Upload a file as the raw request body; the block commits to its SHA-256.
///
/// `filename` travels in the query string, the MIME type in `Content-Type`.
/// A non-blank `comment` makes the block COMBINED.
#[post("/files/upload/")]
pub async fn upload_file(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let mime_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");
    let UploadQuery {
        filename,
        comment,
        chain_id,
    } = query.into_inner();

    let upload = FileUpload::new(&filename, mime_type, body.to_vec());
    upload.validate(state.settings.max_upload_bytes)?;
    let user_id = caller_id(&req);

    let appended = run_blocking(&state, move |s| {
        let chain = s.chains.resolve_chain(chain_id.as_deref())?;
        s.chains
            .append_file(&chain.id, &upload, comment.as_deref(), user_id.as_deref())
    })
    .await?;

    info!(
        "API - file {} stored in block #{} of chain {}",
        filename, appended.block.index, appended.block.chain_id
    );
    Ok(HttpResponse::Created().json(BlockCreatedResponse {
        success: true,
        mining: MiningInfo::from(&appended.report),
        upload_points: appended.upload_points,
        block: appended.block,
    }))
}

#[get("/files/supported-types/")]
pub async fn supported_types(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(SupportedTypesResponse {
        types: ALLOWED_MIME_TYPES.to_vec(),
        max_bytes: state.settings.max_upload_bytes,
    })
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    domain::{
        CreateMemberRequest, DeletionSummary, Member, MemberDetails, Payment, PhotoUpdate,
        UpdateMemberRequest,
    },
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    members: Vec<MemberDto>,
    total: usize,
}

#[derive(Debug, Serialize)]
pub struct MemberDto {
    id: String,
    name: String,
    phone: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    birth_date: Option<NaiveDate>,
    dues_plan: String,
    medical_notes: Option<String>,
    comments: Option<String>,
    has_photo: bool,
    created_at: String,
    updated_at: String,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self {
            has_photo: member.has_photo(),
            id: member.id,
            name: member.name,
            phone: member.phone,
            emergency_contact_name: member.emergency_contact_name,
            emergency_contact_phone: member.emergency_contact_phone,
            birth_date: member.birth_date,
            dues_plan: member.dues_plan,
            medical_notes: member.medical_notes,
            comments: member.comments,
            created_at: member.created_at.to_rfc3339(),
            updated_at: member.updated_at.to_rfc3339(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let members = state.service_context.ledger.search_members(&params.q).await?;

    let total = members.len();
    let members: Vec<MemberDto> = members.into_iter().map(Into::into).collect();

    Ok(Json(ListResponse { members, total }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MemberDto>> {
    let member = state.service_context.ledger.get_member(&id).await?;
    Ok(Json(member.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Json(details): Json<MemberDetails>,
) -> Result<(StatusCode, Json<MemberDto>)> {
    let member = state
        .service_context
        .ledger
        .create_member(CreateMemberRequest { details, photo: None })
        .await?;

    Ok((StatusCode::CREATED, Json(member.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberDto {
    #[serde(flatten)]
    details: MemberDetails,
    #[serde(default)]
    remove_photo: bool,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<UpdateMemberDto>,
) -> Result<Json<MemberDto>> {
    let request = UpdateMemberRequest {
        details: dto.details,
        photo: PhotoUpdate::from_form(None, dto.remove_photo),
    };

    let member = state.service_context.ledger.update_member(&id, request).await?;
    Ok(Json(member.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletionSummary>> {
    let summary = state.service_context.ledger.delete_member(&id).await?;
    Ok(Json(summary))
}

pub async fn payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Payment>>> {
    let member = state.service_context.ledger.get_member(&id).await?;
    let payments = state.service_context.ledger.payment_history(&member.id).await?;
    Ok(Json(payments))
}

#[derive(Debug, Serialize)]
pub struct DefaultAmountResponse {
    member_id: String,
    amount_cents: i64,
}

pub async fn default_amount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DefaultAmountResponse>> {
    let amount_cents = state.service_context.ledger.default_amount_for(&id).await?;
    Ok(Json(DefaultAmountResponse { member_id: id, amount_cents }))
}

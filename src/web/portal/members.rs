use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{
        cents_to_input, format_cents, CreateMemberRequest, Member, MemberDetails, Payment,
        PhotoUpdate, UpdateMemberRequest,
    },
    error::{AppError, Result},
    media::jpeg_data_uri,
    web::{
        templates::{error_page, Flash, FlashQuery, HtmlTemplate},
        uploads::{read_file_field, PHOTO_EXTENSIONS, ROSTER_EXTENSIONS},
    },
};
use super::{
    format_date, member_path, month_options, parse_optional_date, redirect_error, redirect_notice,
    MonthOption,
};

#[derive(Template)]
#[template(path = "members/list.html")]
pub struct MembersTemplate {
    pub flash: Flash,
    pub search_query: String,
    pub members: Vec<MemberRow>,
    pub total: usize,
}

pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub phone: String,
    pub dues_plan: String,
    pub has_photo: bool,
}

#[derive(Template)]
#[template(path = "members/form.html")]
pub struct MemberFormTemplate {
    pub flash: Flash,
    pub title: String,
    pub action: String,
    pub cancel_url: String,
    pub is_edit: bool,
    pub id_locked: bool,
    pub values: MemberFormValues,
    pub plans: Vec<PlanOption>,
    pub photo_uri: String,
}

pub struct PlanOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "members/detail.html")]
pub struct MemberDetailTemplate {
    pub flash: Flash,
    pub member: MemberView,
    pub payments: Vec<PaymentRow>,
    pub total_paid: String,
    pub default_amount: String,
    pub months: Vec<MonthOption>,
    pub current_year: i32,
    pub today: String,
}

pub struct MemberView {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub birth_date: String,
    pub dues_plan: String,
    pub medical_notes: String,
    pub comments: String,
    pub photo_uri: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            initials: member.initials(),
            phone: member.phone.clone().unwrap_or_default(),
            emergency_contact_name: member.emergency_contact_name.clone().unwrap_or_default(),
            emergency_contact_phone: member.emergency_contact_phone.clone().unwrap_or_default(),
            birth_date: member.birth_date.map(format_date).unwrap_or_default(),
            dues_plan: member.dues_plan.clone(),
            medical_notes: member.medical_notes.clone().unwrap_or_default(),
            comments: member.comments.clone().unwrap_or_default(),
            photo_uri: member.photo.as_deref().map(jpeg_data_uri).unwrap_or_default(),
            created_at: member.created_at.format("%d/%m/%Y").to_string(),
            updated_at: member.updated_at.format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

pub struct PaymentRow {
    pub period: String,
    pub amount: String,
    pub payment_date: String,
    pub dues_plan: String,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            period: payment.period_label(),
            amount: format_cents(payment.amount_cents),
            payment_date: format_date(payment.payment_date),
            dues_plan: payment.dues_plan_snapshot.clone(),
        }
    }
}

/// Raw member form fields, kept as typed so a rejected form can be shown
/// again unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemberFormValues {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub birth_date: String,
    pub dues_plan: String,
    pub medical_notes: String,
    pub comments: String,
}

impl MemberFormValues {
    fn from_member(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            phone: member.phone.clone().unwrap_or_default(),
            emergency_contact_name: member.emergency_contact_name.clone().unwrap_or_default(),
            emergency_contact_phone: member.emergency_contact_phone.clone().unwrap_or_default(),
            birth_date: member
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            dues_plan: member.dues_plan.clone(),
            medical_notes: member.medical_notes.clone().unwrap_or_default(),
            comments: member.comments.clone().unwrap_or_default(),
        }
    }

    fn to_details(&self) -> Result<MemberDetails> {
        Ok(MemberDetails {
            id: self.id.clone(),
            name: self.name.clone(),
            phone: Some(self.phone.clone()),
            emergency_contact_name: Some(self.emergency_contact_name.clone()),
            emergency_contact_phone: Some(self.emergency_contact_phone.clone()),
            birth_date: parse_optional_date(&self.birth_date, "birth date")?,
            dues_plan: self.dues_plan.clone(),
            medical_notes: Some(self.medical_notes.clone()),
            comments: Some(self.comments.clone()),
        }
        .normalized())
    }
}

struct SubmittedMemberForm {
    values: MemberFormValues,
    photo: Option<Vec<u8>>,
    remove_photo: bool,
}

async fn read_member_form(multipart: &mut Multipart, max_bytes: usize) -> Result<SubmittedMemberForm> {
    let mut form = SubmittedMemberForm {
        values: MemberFormValues::default(),
        photo: None,
        remove_photo: false,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "photo" {
            form.photo = read_file_field(field, PHOTO_EXTENSIONS, max_bytes).await?;
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed form: {}", e)))?;
        let values = &mut form.values;
        match name.as_str() {
            "id" => values.id = text,
            "name" => values.name = text,
            "phone" => values.phone = text,
            "emergency_contact_name" => values.emergency_contact_name = text,
            "emergency_contact_phone" => values.emergency_contact_phone = text,
            "birth_date" => values.birth_date = text,
            "dues_plan" => values.dues_plan = text,
            "medical_notes" => values.medical_notes = text,
            "comments" => values.comments = text,
            "remove_photo" => form.remove_photo = true,
            _ => {}
        }
    }

    Ok(form)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn members_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let members = match state.service_context.ledger.search_members(&query.q).await {
        Ok(members) => members,
        Err(e) => return error_page(e),
    };

    let members: Vec<MemberRow> = members
        .iter()
        .map(|m| MemberRow {
            id: m.id.clone(),
            name: m.name.clone(),
            initials: m.initials(),
            phone: m.phone.clone().unwrap_or_default(),
            dues_plan: m.dues_plan.clone(),
            has_photo: m.has_photo(),
        })
        .collect();

    HtmlTemplate(MembersTemplate {
        flash: flash.into(),
        search_query: query.q,
        total: members.len(),
        members,
    })
    .into_response()
}

pub async fn new_member_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    render_form(&state, None, MemberFormValues::default(), "", flash.into()).await
}

pub async fn create_member(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match read_member_form(&mut multipart, state.settings.photos.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => return redirect_error("/members/new", &e.user_message()),
    };

    let result = match form.values.to_details() {
        Ok(details) => {
            state
                .service_context
                .ledger
                .create_member(CreateMemberRequest { details, photo: form.photo })
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(member) => redirect_notice(
            &member_path(&member.id),
            &format!("Member {} created", member.name),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Member creation rejected");
            render_form(&state, None, form.values, "", Flash::error(e.user_message())).await
        }
    }
}

pub async fn member_detail_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let ledger = &state.service_context.ledger;

    let member = match ledger.get_member(&id).await {
        Ok(member) => member,
        Err(e) => return error_page(e),
    };
    let payments = match ledger.payment_history(&member.id).await {
        Ok(payments) => payments,
        Err(e) => return error_page(e),
    };
    let default_amount = match ledger.dues_schedule().await {
        Ok(schedule) => schedule.amount_for(&member.dues_plan),
        Err(e) => return error_page(e),
    };

    let today = Utc::now().date_naive();
    HtmlTemplate(MemberDetailTemplate {
        flash: flash.into(),
        member: MemberView::from(&member),
        total_paid: format_cents(payments.iter().map(|p| p.amount_cents).sum()),
        payments: payments.iter().map(PaymentRow::from).collect(),
        default_amount: cents_to_input(default_amount),
        months: month_options(today.month()),
        current_year: today.year(),
        today: today.format("%Y-%m-%d").to_string(),
    })
    .into_response()
}

pub async fn edit_member_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.service_context.ledger.get_member(&id).await {
        Ok(member) => {
            let photo_uri = member.photo.as_deref().map(jpeg_data_uri).unwrap_or_default();
            render_form(
                &state,
                Some(&member.id),
                MemberFormValues::from_member(&member),
                &photo_uri,
                flash.into(),
            )
            .await
        }
        Err(e) => error_page(e),
    }
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let edit_url = format!("{}/edit", member_path(&id));
    let form = match read_member_form(&mut multipart, state.settings.photos.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => return redirect_error(&edit_url, &e.user_message()),
    };

    let ledger = &state.service_context.ledger;
    let result = match form.values.to_details() {
        Ok(details) => {
            let request = UpdateMemberRequest {
                details,
                photo: PhotoUpdate::from_form(form.photo, form.remove_photo),
            };
            ledger.update_member(&id, request).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(member) => redirect_notice(&member_path(&member.id), "Member updated"),
        Err(AppError::NotFound(msg)) => error_page(AppError::NotFound(msg)),
        Err(e) => {
            tracing::warn!(member_id = %id, error = %e, "Member update rejected");
            let photo_uri = match ledger.find_member(&id).await {
                Ok(Some(member)) => member.photo.as_deref().map(jpeg_data_uri).unwrap_or_default(),
                _ => String::new(),
            };
            render_form(&state, Some(&id), form.values, &photo_uri, Flash::error(e.user_message())).await
        }
    }
}

pub async fn delete_member(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.service_context.ledger.delete_member(&id).await {
        Ok(summary) => redirect_notice(
            "/members",
            &format!(
                "Deleted {} ({}) and {} payment(s)",
                summary.member_name, summary.member_id, summary.payments_deleted
            ),
        ),
        Err(e) => redirect_error(&member_path(&id), &e.user_message()),
    }
}

pub async fn export_members(State(state): State<AppState>) -> Response {
    match state.service_context.ledger.export_members().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"members.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_page(e),
    }
}

pub async fn import_members(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let data = match read_roster_upload(&mut multipart, state.settings.photos.max_upload_bytes).await {
        Ok(data) => data,
        Err(e) => return redirect_error("/members", &e.user_message()),
    };

    match state.service_context.ledger.import_members(&data).await {
        Ok(summary) => {
            let mut message = format!(
                "Import finished: {} created, {} updated, {} skipped",
                summary.created,
                summary.updated,
                summary.skipped.len()
            );
            if !summary.skipped.is_empty() {
                let lines: Vec<String> = summary
                    .skipped
                    .iter()
                    .map(|row| format!("line {}: {}", row.line, row.reason))
                    .collect();
                message.push_str(&format!(" ({})", lines.join("; ")));
            }
            redirect_notice("/members", &message)
        }
        Err(e) => redirect_error("/members", &e.user_message()),
    }
}

async fn read_roster_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form: {}", e)))?
    {
        if field.name() == Some("file") {
            return read_file_field(field, ROSTER_EXTENSIONS, max_bytes)
                .await?
                .ok_or_else(|| AppError::Validation("Choose a CSV file to import".to_string()));
        }
    }

    Err(AppError::Validation("Choose a CSV file to import".to_string()))
}

async fn render_form(
    state: &AppState,
    current_id: Option<&str>,
    mut values: MemberFormValues,
    photo_uri: &str,
    flash: Flash,
) -> Response {
    let plans = match state.service_context.dues_plan_service.list(false).await {
        Ok(plans) => plans,
        Err(e) => return error_page(e),
    };

    if values.dues_plan.is_empty() {
        if let Some(first) = plans.first() {
            values.dues_plan = first.name.clone();
        }
    }

    let mut options: Vec<PlanOption> = plans
        .iter()
        .map(|p| PlanOption {
            selected: p.name == values.dues_plan,
            name: p.name.clone(),
        })
        .collect();
    // Keep labels that are no longer (or never were) in the plan table
    if !values.dues_plan.is_empty() && !options.iter().any(|o| o.selected) {
        options.push(PlanOption {
            name: values.dues_plan.clone(),
            selected: true,
        });
    }

    let template = match current_id {
        Some(id) => MemberFormTemplate {
            flash,
            title: format!("Edit {}", values.name),
            action: format!("{}/edit", member_path(id)),
            cancel_url: member_path(id),
            is_edit: true,
            id_locked: !state.service_context.ledger.allows_id_rename(),
            values,
            plans: options,
            photo_uri: photo_uri.to_string(),
        },
        None => MemberFormTemplate {
            flash,
            title: "New member".to_string(),
            action: "/members/new".to_string(),
            cancel_url: "/members".to_string(),
            is_edit: false,
            id_locked: false,
            values,
            plans: options,
            photo_uri: String::new(),
        },
    };

    HtmlTemplate(template).into_response()
}

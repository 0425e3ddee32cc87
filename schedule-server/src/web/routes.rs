//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{
    Brigade, BrigadeDef, Company, CompanyFields, Departure, Id, Line, LineStop, LineStopEdit, Stop,
    TimetableEntry, TimetableRow, Trip, TripSummary, TypeOfDay, validate,
};
use crate::error::StoreError;
use crate::store::{
    Conn, brigades, companies, departures, line_stops, lines, stops, timetable, trips,
    types_of_days,
};

use super::dto::*;
use super::extract::{ApiPath, ApiQuery};
use super::state::AppState;

/// Create the application router.
///
/// `cors_origin` is the one browser origin allowed to call the API.
pub fn create_router(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/stops", get(list_stops).post(create_stop))
        .route(
            "/api/stops/:id",
            get(get_stop).put(update_stop).delete(delete_stop),
        )
        .route("/api/lines", get(list_lines).post(create_line))
        .route(
            "/api/lines/:id",
            get(get_line).put(update_line).delete(delete_line),
        )
        .route("/api/lines/:id/stops", get(line_stops_of_line))
        .route(
            "/api/line-stops",
            post(upsert_line_stops).delete(remove_line_stops),
        )
        .route(
            "/api/types-of-days",
            get(list_types_of_days).post(create_type_of_day),
        )
        .route(
            "/api/types-of-days/:id",
            get(get_type_of_day)
                .put(update_type_of_day)
                .delete(delete_type_of_day),
        )
        .route("/api/types-of-days/:id/shortage-name", get(shortage_name))
        .route("/api/companies", get(list_companies).post(create_company))
        .route(
            "/api/companies/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/timetable", post(save_timetable))
        .route("/api/timetable/:line_id", get(get_timetable))
        .route("/api/trip-times", post(set_trip_time))
        .route("/api/trips", get(list_trips).post(create_trip))
        .route("/api/trips/max-id", get(max_trip_id))
        .route("/api/departures", get(departure_board))
        .route("/api/brigades", get(brigades_by_working_time))
        .route(
            "/api/brigades/:type_of_day_id",
            get(brigades_for_day).put(replace_brigades),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Parse a JSON body, reporting malformed input as a bad request.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid JSON: {e}"),
    })
}

async fn connection(state: &AppState) -> Result<Conn, AppError> {
    Ok(state.db.acquire().await?)
}

// Stops

async fn list_stops(State(state): State<AppState>) -> Result<Json<Vec<Stop>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(stops::list(&mut conn).await?))
}

async fn get_stop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Stop>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(stops::get(&mut conn, id).await?))
}

async fn create_stop(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Stop>), AppError> {
    let req: StopRequest = parse_body(&body)?;
    validate::required("stop name", &req.name)?;
    let mut conn = connection(&state).await?;
    let stop = stops::create(&mut conn, &req.name).await?;
    Ok((StatusCode::CREATED, Json(stop)))
}

async fn update_stop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    body: Bytes,
) -> Result<Json<Stop>, AppError> {
    let req: StopRequest = parse_body(&body)?;
    validate::required("stop name", &req.name)?;
    let mut conn = connection(&state).await?;
    Ok(Json(stops::update(&mut conn, id, &req.name).await?))
}

async fn delete_stop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, AppError> {
    let mut conn = connection(&state).await?;
    stops::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Lines and their stops

async fn list_lines(State(state): State<AppState>) -> Result<Json<Vec<Line>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(lines::list(&mut conn).await?))
}

async fn get_line(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Line>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(lines::get(&mut conn, id).await?))
}

async fn create_line(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Line>), AppError> {
    let req: LineRequest = parse_body(&body)?;
    validate::required("line number", &req.number)?;
    let mut conn = connection(&state).await?;
    let line = lines::create(&mut conn, &req.number).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn update_line(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    body: Bytes,
) -> Result<Json<Line>, AppError> {
    let req: LineRequest = parse_body(&body)?;
    validate::required("line number", &req.number)?;
    let mut conn = connection(&state).await?;
    Ok(Json(lines::update(&mut conn, id, &req.number).await?))
}

async fn delete_line(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, AppError> {
    let mut conn = connection(&state).await?;
    lines::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn line_stops_of_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Id>,
) -> Result<Json<Vec<LineStop>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(line_stops::for_line(&mut conn, line_id).await?))
}

async fn upsert_line_stops(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let entries: Vec<LineStopEdit> = parse_body(&body)?;
    validate::non_empty("line stop batch", &entries)?;
    for entry in &entries {
        validate::direction(entry.direction)?;
    }
    let mut conn = connection(&state).await?;
    line_stops::upsert(&mut conn, &entries).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_line_stops(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let ids: Vec<Id> = parse_body(&body)?;
    let mut conn = connection(&state).await?;
    line_stops::remove(&mut conn, &ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Types of day

async fn list_types_of_days(
    State(state): State<AppState>,
) -> Result<Json<Vec<TypeOfDay>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(types_of_days::list(&mut conn).await?))
}

async fn get_type_of_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<TypeOfDay>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(types_of_days::get(&mut conn, id).await?))
}

async fn create_type_of_day(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<TypeOfDay>), AppError> {
    let req: TypeOfDayRequest = parse_body(&body)?;
    validate::required("type of day name", &req.name)?;
    let mut conn = connection(&state).await?;
    let day = types_of_days::create(&mut conn, &req.name, req.shortage_name.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(day)))
}

async fn update_type_of_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    body: Bytes,
) -> Result<Json<TypeOfDay>, AppError> {
    let req: TypeOfDayRequest = parse_body(&body)?;
    validate::required("type of day name", &req.name)?;
    let mut conn = connection(&state).await?;
    let day = types_of_days::update(&mut conn, id, &req.name, req.shortage_name.as_deref()).await?;
    Ok(Json(day))
}

async fn delete_type_of_day(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, AppError> {
    let mut conn = connection(&state).await?;
    types_of_days::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn shortage_name(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<ShortageNameResponse>, AppError> {
    let mut conn = connection(&state).await?;
    let shortage_name = types_of_days::shortage_name(&mut conn, id).await?;
    Ok(Json(ShortageNameResponse { shortage_name }))
}

// Companies

async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(companies::list(&mut conn).await?))
}

async fn get_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Company>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(companies::get(&mut conn, id).await?))
}

async fn create_company(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let fields: CompanyFields = parse_body(&body)?;
    validate::required("company name", &fields.name)?;
    let mut conn = connection(&state).await?;
    let company = companies::create(&mut conn, &fields).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    body: Bytes,
) -> Result<Json<Company>, AppError> {
    let fields: CompanyFields = parse_body(&body)?;
    validate::required("company name", &fields.name)?;
    let mut conn = connection(&state).await?;
    Ok(Json(companies::update(&mut conn, id, &fields).await?))
}

async fn delete_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, AppError> {
    let mut conn = connection(&state).await?;
    companies::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Timetables and trips

async fn get_timetable(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Id>,
) -> Result<Json<Vec<TimetableRow>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(timetable::for_line(&mut conn, line_id).await?))
}

async fn save_timetable(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let entries: Vec<TimetableEntry> = parse_body(&body)?;
    validate::non_empty("timetable batch", &entries)?;
    let mut conn = connection(&state).await?;
    timetable::save(&mut conn, &entries).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_trip_time(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TripTimeResponse>, AppError> {
    let req: TripTimeRequest = parse_body(&body)?;
    let mut conn = connection(&state).await?;
    let trip_time_id =
        timetable::set_trip_time(&mut conn, req.trip_id, req.line_stop_id, req.time).await?;
    Ok(Json(TripTimeResponse { trip_time_id }))
}

/// Trip summaries, optionally filtered.
///
/// A filtered query that matches nothing is reported as not found.
async fn list_trips(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TripsQuery>,
) -> Result<Json<Vec<TripSummary>>, AppError> {
    let mut conn = connection(&state).await?;
    let summaries =
        trips::summaries(&mut conn, query.type_of_day_id, query.min_duration_minutes).await?;

    if summaries.is_empty() && query.is_filtered() {
        return Err(AppError::NotFound {
            message: "No trips match the given filters".to_string(),
        });
    }
    Ok(Json(summaries))
}

async fn create_trip(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let req: Trip = parse_body(&body)?;
    let mut conn = connection(&state).await?;
    let trip = trips::create(&mut conn, req.id, req.type_of_day_id).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn max_trip_id(State(state): State<AppState>) -> Result<Json<MaxTripIdResponse>, AppError> {
    let mut conn = connection(&state).await?;
    let max_trip_id = trips::max_id(&mut conn).await?;
    Ok(Json(MaxTripIdResponse { max_trip_id }))
}

/// Departures from a stop, starting from the server's local time.
async fn departure_board(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeparturesQuery>,
) -> Result<Json<Vec<Departure>>, AppError> {
    validate::window_minutes(query.window)?;
    let now = Local::now().naive_local();
    let mut conn = connection(&state).await?;
    let board = departures::board(
        &mut conn,
        query.stop_id,
        query.window,
        query.type_of_day_id,
        now,
    )
    .await?;
    Ok(Json(board))
}

// Brigades

async fn brigades_for_day(
    State(state): State<AppState>,
    ApiPath(type_of_day_id): ApiPath<Id>,
) -> Result<Json<Vec<Brigade>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(brigades::for_day(&mut conn, type_of_day_id).await?))
}

async fn replace_brigades(
    State(state): State<AppState>,
    ApiPath(type_of_day_id): ApiPath<Id>,
    body: Bytes,
) -> Result<Json<Vec<Brigade>>, AppError> {
    let defs: Vec<BrigadeDef> = parse_body(&body)?;
    validate::non_empty("brigade list", &defs)?;
    for def in &defs {
        validate::required("brigade name", &def.name)?;
    }
    let mut conn = connection(&state).await?;
    Ok(Json(brigades::replace(&mut conn, type_of_day_id, &defs).await?))
}

async fn brigades_by_working_time(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BrigadesQuery>,
) -> Result<Json<Vec<Brigade>>, AppError> {
    let mut conn = connection(&state).await?;
    Ok(Json(
        brigades::shorter_than(&mut conn, query.max_working_time).await?,
    ))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String, detail: String },
    Internal { message: String, detail: Option<String> },
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            StoreError::NotFound(message) => AppError::NotFound { message },
            StoreError::Conflict { message, detail } => AppError::Conflict { message, detail },
            StoreError::Internal { .. } => AppError::Internal {
                detail: e.detail(),
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message, detail) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, "validation", message, None),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, "not_found", message, None),
            AppError::Conflict { message, detail } => {
                (StatusCode::CONFLICT, "conflict", message, Some(detail))
            }
            AppError::Internal { message, detail } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message, detail)
            }
        };

        if status.is_server_error() {
            error!(%status, %message, ?detail, "request failed");
        } else {
            warn!(%status, %message, ?detail, "request rejected");
        }

        let body = Json(ErrorResponse {
            kind,
            error: message,
            detail,
        });
        (status, body).into_response()
    }
}

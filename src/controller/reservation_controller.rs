use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use serde_json::json;
use tracing::{error, info, warn};
use crate::controller::AppState;
use crate::helpers::required_json::RequiredJson;
use crate::models::reservation::Reservation;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/reservations/licensePlate/:licensePlate", get(check_license_plate))
        .route("/reservation", post(create_reservation))
        .route(
            "/reservations/:reservation_id",
            patch(update_reservation).delete(delete_reservation),
        )
        .route_layer(Extension(app_state))
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message}))).into_response()
}

/// Ids are 32-bit to match the SERIAL column, so a numeric id beyond
/// `i32::MAX` is rejected with 400 rather than treated as an unknown row.
fn parse_reservation_id(raw: &str) -> Result<i32, Response> {
    raw.parse::<i32>().map_err(|e| {
        warn!("Rejecting reservation id: {}, due to: {}", raw, e);
        message_response(StatusCode::BAD_REQUEST, "Invalid reservation id")
    })
}

pub async fn check_license_plate(
    Extension(app_state): Extension<AppState>,
    Path(license_plate): Path<String>,
) -> Response {
    let exists_res = app_state.reservation_repo
        .license_plate_exists(&license_plate)
        .await;

    return match exists_res {
        Ok(exists) => {
            (StatusCode::OK, Json(json!({"exists": exists}))).into_response()
        }
        Err(e) => {
            error!("Error checking license plate: {:#}", e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error checking license plate")
        }
    };
}

/// The duplicate plate check and the insert are two separate statements, so
/// concurrent creates for one plate can both get through.
pub async fn create_reservation(
    Extension(app_state): Extension<AppState>,
    RequiredJson(mut new_reservation): RequiredJson<Reservation>,
) -> Response {
    if app_state.enforce_unique_plate {
        match app_state.reservation_repo
            .license_plate_exists(&new_reservation.license_plate)
            .await
        {
            Ok(true) => {
                return message_response(StatusCode::CONFLICT, "Reservation already exists");
            }
            Ok(false) => {}
            Err(e) => {
                error!("Error checking reservation existence: {:#}", e);
                return message_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error checking reservation existence",
                );
            }
        }
    }

    let insert_res = app_state.reservation_repo
        .insert_reservation(&new_reservation)
        .await;

    return match insert_res {
        Ok(reservation_id) => {
            info!("Created reservation: {}", reservation_id);
            new_reservation.reservation_id = reservation_id;
            (StatusCode::CREATED, Json(new_reservation)).into_response()
        }
        Err(e) => {
            error!("Error inserting reservation: {:#}", e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error inserting reservation")
        }
    };
}

/// Full replace. An unknown id affects no rows and still answers 200 with
/// the submitted body.
pub async fn update_reservation(
    Extension(app_state): Extension<AppState>,
    Path(reservation_id): Path<String>,
    RequiredJson(updated_reservation): RequiredJson<Reservation>,
) -> Response {
    let reservation_id = match parse_reservation_id(&reservation_id) {
        Ok(reservation_id) => reservation_id,
        Err(response) => return response,
    };

    let update_res = app_state.reservation_repo
        .update_reservation(reservation_id, &updated_reservation)
        .await;

    return match update_res {
        Ok(_) => {
            (StatusCode::OK, Json(updated_reservation)).into_response()
        }
        Err(e) => {
            error!("Error updating reservation: {:#}", e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error updating reservation")
        }
    };
}

pub async fn delete_reservation(
    Extension(app_state): Extension<AppState>,
    Path(reservation_id): Path<String>,
) -> Response {
    let reservation_id = match parse_reservation_id(&reservation_id) {
        Ok(reservation_id) => reservation_id,
        Err(response) => return response,
    };

    let delete_res = app_state.reservation_repo
        .delete_reservation(reservation_id)
        .await;

    return match delete_res {
        Ok(_) => {
            message_response(StatusCode::OK, "reservation deleted")
        }
        Err(e) => {
            error!("Error deleting reservation: {:#}", e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error deleting reservation")
        }
    };
}

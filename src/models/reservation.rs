use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// A single reservation as it travels over the wire.
///
/// `reservation_id` is assigned by the database. On input it is optional and
/// defaults to 0, also when sent as `null`. Create overwrites it with the new
/// id, update echoes it back as submitted.
#[derive(Serialize, Deserialize, Validate, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(rename = "reservation_id", default, deserialize_with = "null_as_zero")]
    pub reservation_id: i32,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub license_plate: String,
    #[validate(length(min = 1))]
    pub date_of_departure: String,
    #[validate(length(min = 1))]
    pub date_of_arrival: String,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or_default())
}

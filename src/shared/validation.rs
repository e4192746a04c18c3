//! Input validation for account, tour, booking and review data.
//!
//! Validators collect every problem into a `FieldErrors` map keyed by the
//! camelCase field name the API uses.

use crate::errors::{AppError, FieldErrorMap};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::RangeInclusive};
use uuid::Uuid;

const EMAIL_MIN_LEN: usize = 5;
const EMAIL_MAX_LEN: usize = 255;
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 100;
const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 100;

const TOUR_TITLE_LEN: RangeInclusive<usize> = 5..=100;
const TOUR_DESCRIPTION_LEN: RangeInclusive<usize> = 20..=1000;
/// Tour length in minutes: half an hour up to a full day.
const TOUR_DURATION: RangeInclusive<u32> = 30..=24 * 60;
const GROUP_SIZE: RangeInclusive<u32> = 1..=50;
const REVIEW_RATING: RangeInclusive<u8> = 1..=5;
const REVIEW_COMMENT_LEN: RangeInclusive<usize> = 10..=500;
const SEARCH_RATING: RangeInclusive<f64> = 1.0..=5.0;
const SEARCH_LIMIT: RangeInclusive<u32> = 1..=100;
const GEO_POINT: &str = "Point";

/// Collects messages per field so callers can report every problem at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: FieldErrorMap,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record every message from `messages` under `field`.
    pub fn extend(&mut self, field: &str, messages: Vec<String>) {
        for message in messages {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    ///
    /// # Errors
    /// Returns `AppError::Validation` with the collected field map.
    pub fn into_result(self, message: &str) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation {
                message: message.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// Normalize an email for lookup and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[must_use]
pub fn valid_email_format(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Messages for an email address; empty when valid.
#[must_use]
pub fn validate_email(email: &str) -> Vec<String> {
    let mut messages = Vec::new();
    if !valid_email_format(email) {
        messages.push("Invalid email address".to_string());
    }
    let len = email.chars().count();
    if len < EMAIL_MIN_LEN {
        messages.push(format!("Email must be at least {EMAIL_MIN_LEN} characters"));
    }
    if len > EMAIL_MAX_LEN {
        messages.push(format!("Email must be less than {EMAIL_MAX_LEN} characters"));
    }
    messages
}

/// Messages for a new password; empty when valid.
///
/// Requires at least one lowercase letter, one uppercase letter and one digit.
#[must_use]
pub fn validate_password(password: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        messages.push(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        ));
    }
    if len > PASSWORD_MAX_LEN {
        messages.push(format!(
            "Password must be less than {PASSWORD_MAX_LEN} characters"
        ));
    }
    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        messages.push(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        );
    }
    messages
}

#[must_use]
pub fn validate_name(name: &str) -> Vec<String> {
    let len = name.trim().chars().count();
    if len < NAME_MIN_LEN {
        vec![format!("Name must be at least {NAME_MIN_LEN} characters")]
    } else if len > NAME_MAX_LEN {
        vec![format!("Name must be less than {NAME_MAX_LEN} characters")]
    } else {
        Vec::new()
    }
}

/// Validate a registration request as a whole.
///
/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.extend("email", validate_email(email));
    errors.extend("password", validate_password(password));
    errors.extend("name", validate_name(name));
    errors.into_result("Invalid registration data")
}

/// Validate a partial profile update; absent fields are skipped.
///
/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_profile_update(name: Option<&str>, email: Option<&str>) -> Result<(), AppError> {
    validate_user_update(&UserUpdateInput {
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        ..UserUpdateInput::default()
    })
}

/// Current password is mandatory whenever a new one is set.
pub const CURRENT_PASSWORD_REQUIRED: &str =
    "Current password is required when setting a new password";
pub const PRICE_RANGE_ORDER: &str = "Minimum price must be less than or equal to maximum price";
pub const DURATION_RANGE_ORDER: &str =
    "Minimum duration must be less than or equal to maximum duration";
pub const DATE_RANGE_ORDER: &str = "Start date must be before or equal to end date";

fn check_len(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: &str,
    bounds: &RangeInclusive<usize>,
) {
    let len = value.chars().count();
    if len < *bounds.start() {
        errors.add(field, format!("{label} must be at least {} characters", bounds.start()));
    } else if len > *bounds.end() {
        errors.add(field, format!("{label} must be at most {} characters", bounds.end()));
    }
}

fn check_range<T: PartialOrd + Display>(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: T,
    bounds: &RangeInclusive<T>,
) {
    if bounds.contains(&value) {
        return;
    }
    if value < *bounds.start() {
        errors.add(field, format!("{label} must be at least {}", bounds.start()));
    } else {
        errors.add(field, format!("{label} must be at most {}", bounds.end()));
    }
}

fn check_non_negative(errors: &mut FieldErrors, field: &str, label: &str, value: f64) {
    if value.is_nan() || value < 0.0 {
        errors.add(field, format!("{label} must be at least 0"));
    }
}

fn check_uuid(errors: &mut FieldErrors, field: &str, value: &str) {
    if Uuid::parse_str(value).is_err() {
        errors.add(field, "Invalid uuid");
    }
}

/// Everything a user may change about their account in one request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// # Errors
/// Returns `AppError::Validation` listing every invalid field, including a
/// `currentPassword` entry when a new password comes without the current one.
pub fn validate_user_update(input: &UserUpdateInput) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &input.name {
        errors.extend("name", validate_name(name));
    }
    if let Some(email) = &input.email {
        errors.extend("email", validate_email(email));
    }
    if let Some(new_password) = &input.new_password {
        errors.extend("newPassword", validate_password(new_password));
        if input.current_password.as_deref().unwrap_or_default().is_empty() {
            errors.add("currentPassword", CURRENT_PASSWORD_REQUIRED);
        }
    }
    errors.into_result("Invalid profile data")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Difficult,
}

/// GeoJSON point plus a postal address.
#[derive(Debug, Clone, Deserialize)]
pub struct TourLocation {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: (f64, f64),
    pub address: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourInput {
    pub title: String,
    pub description: String,
    /// Minutes.
    pub duration: u32,
    pub price: f64,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub start_dates: Vec<DateTime<Utc>>,
    pub location: TourLocation,
}

/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_tour(tour: &TourInput) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    check_len(&mut errors, "title", "Title", &tour.title, &TOUR_TITLE_LEN);
    check_len(
        &mut errors,
        "description",
        "Description",
        &tour.description,
        &TOUR_DESCRIPTION_LEN,
    );
    check_range(&mut errors, "duration", "Duration", tour.duration, &TOUR_DURATION);
    check_non_negative(&mut errors, "price", "Price", tour.price);
    check_range(
        &mut errors,
        "maxGroupSize",
        "Group size",
        tour.max_group_size,
        &GROUP_SIZE,
    );
    if tour.start_dates.is_empty() {
        errors.add("startDates", "Tour must have at least one start date");
    }
    if tour.location.kind != GEO_POINT {
        errors.add(
            "location.type",
            format!("Invalid literal value, expected \"{GEO_POINT}\""),
        );
    }
    errors.into_result("Invalid tour data")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    pub tour_id: String,
    pub start_date: DateTime<Utc>,
    pub participants: u32,
}

/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_booking(booking: &BookingInput) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    check_uuid(&mut errors, "tourId", &booking.tour_id);
    check_range(
        &mut errors,
        "participants",
        "Participants",
        booking.participants,
        &GROUP_SIZE,
    );
    errors.into_result("Invalid booking data")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub tour_id: String,
    pub rating: u8,
    pub comment: String,
}

/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_review(review: &ReviewInput) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    check_uuid(&mut errors, "tourId", &review.tour_id);
    check_range(&mut errors, "rating", "Rating", review.rating, &REVIEW_RATING);
    check_len(
        &mut errors,
        "comment",
        "Comment",
        &review.comment,
        &REVIEW_COMMENT_LEN,
    );
    errors.into_result("Invalid review data")
}

/// Tour search filters; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub min_rating: Option<f64>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

/// Checks each bound, then that every min/max and start/end pair is ordered.
///
/// # Errors
/// Returns `AppError::Validation` listing every invalid field.
pub fn validate_search_params(params: &SearchParams) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(min_price) = params.min_price {
        check_non_negative(&mut errors, "minPrice", "Minimum price", min_price);
    }
    if let Some(max_price) = params.max_price {
        check_non_negative(&mut errors, "maxPrice", "Maximum price", max_price);
    }
    if let Some(min_duration) = params.min_duration {
        if min_duration < *TOUR_DURATION.start() {
            errors.add(
                "minDuration",
                format!("Minimum duration must be at least {}", TOUR_DURATION.start()),
            );
        }
    }
    if let Some(max_duration) = params.max_duration {
        if max_duration > *TOUR_DURATION.end() {
            errors.add(
                "maxDuration",
                format!("Maximum duration must be at most {}", TOUR_DURATION.end()),
            );
        }
    }
    if let Some(min_rating) = params.min_rating {
        check_range(&mut errors, "minRating", "Minimum rating", min_rating, &SEARCH_RATING);
    }
    if params.page == Some(0) {
        errors.add("page", "Page must be at least 1");
    }
    if let Some(limit) = params.limit {
        check_range(&mut errors, "limit", "Limit", limit, &SEARCH_LIMIT);
    }

    if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
        if min > max {
            errors.add("minPrice", PRICE_RANGE_ORDER);
        }
    }
    if let (Some(min), Some(max)) = (params.min_duration, params.max_duration) {
        if min > max {
            errors.add("minDuration", DURATION_RANGE_ORDER);
        }
    }
    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if start > end {
            errors.add("startDate", DATE_RANGE_ORDER);
        }
    }
    errors.into_result("Invalid search parameters")
}

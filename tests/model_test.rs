use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use taskdeck::error::ClientError;
use taskdeck::models::{Category, Priority, Task, TaskStatus, datetime};
use taskdeck::notify::{Notice, NoticeLevel};
use reqwest::StatusCode;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid datetime")
}

#[test]
fn test_datetime_accepts_form_and_server_formats() {
    let expected = at(2025, 1, 1, 10, 0);

    assert_eq!(datetime::parse("2025-01-01T10:00"), Some(expected));
    assert_eq!(datetime::parse("2025-01-01T10:00:00"), Some(expected));
    assert_eq!(datetime::parse("2025-01-01T10:00:00.000"), Some(expected));
    assert_eq!(datetime::parse("2025-01-01T10:00:00Z"), Some(expected));
    assert_eq!(datetime::parse("tomorrow"), None);
    assert_eq!(datetime::format_wire(&expected), "2025-01-01T10:00:00");
    assert_eq!(datetime::format_display(None), "-");
}

#[test]
fn test_category_uses_server_field_name() {
    let category: Category =
        serde_json::from_value(json!({ "id": 4, "category": "Side Projects" })).expect("decode");

    assert_eq!(category.name, "Side Projects");
    assert_eq!(category.route(), "/side projects");
    let encoded = serde_json::to_value(&category).expect("encode");
    assert_eq!(encoded["category"], "Side Projects");
}

#[test]
fn test_task_decodes_server_shape() {
    let task: Task = serde_json::from_value(json!({
        "id": 9,
        "categoryId": 3,
        "title": "Pay rent",
        "description": null,
        "priority": "HIGH",
        "status": "IN_PROGRESS",
        "deadline": "2025-02-01T08:30:00",
        "createdAt": "2025-01-20T12:00:00.123",
        "updatedAt": ""
    }))
    .expect("decode task");

    assert_eq!(task.category_id, Some(3));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.deadline, Some(at(2025, 2, 1, 8, 30)));
    assert!(task.created_at.is_some());
    assert!(task.updated_at.is_none());
}

#[test]
fn test_enums_parse_loosely() {
    assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
    assert_eq!(" Low ".parse::<Priority>(), Ok(Priority::Low));
    assert_eq!("in progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
    assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
    assert!("urgent".parse::<Priority>().is_err());
}

#[test]
fn test_conflict_message_from_body() {
    let from_json = ClientError::from_status(
        StatusCode::CONFLICT,
        r#"{"message":"Category Home already exists"}"#.to_string(),
    );
    let from_text = ClientError::from_status(StatusCode::CONFLICT, "taken".to_string());
    let empty = ClientError::from_status(StatusCode::CONFLICT, String::new());
    let other = ClientError::from_status(StatusCode::BAD_GATEWAY, "gateway".to_string());

    assert_eq!(from_json.user_message(), "Category Home already exists");
    assert_eq!(from_text.user_message(), "taken");
    assert_eq!(empty.user_message(), "Already exists");
    assert!(!other.is_conflict());
}

#[test]
fn test_notice_levels_follow_envelope_status() {
    assert_eq!(NoticeLevel::from_status("ok"), NoticeLevel::Success);
    assert_eq!(NoticeLevel::from_status("validation"), NoticeLevel::Validation);
    assert_eq!(NoticeLevel::from_status("error"), NoticeLevel::Error);
    assert_eq!(Notice::validation("Pick a name").to_string(), "[warning] Pick a name");
}

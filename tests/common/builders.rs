use run_report::events::event_model::{
    Annotation, RawError, RawStatus, RawStep, RawTestEvent,
};

/// An attempt event for `title` with the given retry index and status.
pub fn event(title: &str, retry: u32, status: RawStatus, duration: u64) -> RawTestEvent {
    RawTestEvent {
        id: Some(format!("id-{}", title)),
        title_path: vec![
            String::new(),
            "chromium".into(),
            "login.spec.ts".into(),
            title.to_string(),
        ],
        project_name: Some("chromium".into()),
        retry,
        status: Some(status),
        duration,
        ..RawTestEvent::default()
    }
}

pub fn timed(mut e: RawTestEvent, start_ms: i64) -> RawTestEvent {
    e.start_time = Some(start_ms);
    e
}

pub fn with_errors(mut e: RawTestEvent, messages: &[&str]) -> RawTestEvent {
    e.errors = messages.iter().map(|m| RawError::with_message(*m)).collect();
    e
}

pub fn with_annotation(mut e: RawTestEvent, kind: &str, description: Option<&str>) -> RawTestEvent {
    e.annotations.push(Annotation {
        kind: kind.to_string(),
        description: description.map(str::to_string),
    });
    e
}

pub fn step(title: &str, children: Vec<RawStep>) -> RawStep {
    RawStep {
        title: title.to_string(),
        category: Some("test.step".into()),
        duration: Some(10),
        error: None,
        steps: children,
    }
}

pub fn hook(title: &str, children: Vec<RawStep>) -> RawStep {
    RawStep {
        title: title.to_string(),
        category: Some("hook".into()),
        duration: None,
        error: None,
        steps: children,
    }
}

pub fn failing_step(title: &str) -> RawStep {
    RawStep {
        error: Some(serde_json::json!({ "message": "boom" })),
        ..step(title, vec![])
    }
}

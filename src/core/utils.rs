use chrono::{DateTime, FixedOffset, Offset, Utc};

const RESPONSE_UTC_OFFSET_SECS: i32 = 7 * 60 * 60; // +0700
const RESPONSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn response_offset() -> FixedOffset {
    FixedOffset::east_opt(RESPONSE_UTC_OFFSET_SECS).unwrap_or(Utc.fix())
}

pub fn datetime_to_string(datetime: DateTime<FixedOffset>) -> String {
    datetime
        .with_timezone(&response_offset())
        .format(RESPONSE_FORMAT)
        .to_string()
}

pub fn datetime_to_string_opt(datetime: Option<DateTime<FixedOffset>>) -> Option<String> {
    datetime.map(datetime_to_string)
}

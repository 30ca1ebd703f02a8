diesel::table! {
    submissions (id) {
        id -> Text,
        status -> Text,
        result -> Nullable<Text>,
        failed_task -> Nullable<Text>,
        failure_reason -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

/// DDL matching the `submissions` table above
pub const CREATE_SUBMISSIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS submissions (
    id TEXT PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    result TEXT,
    failed_task TEXT,
    failure_reason TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

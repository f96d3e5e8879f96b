//! Diesel schema for processing task persistence and the collaborator
//! tables the orchestration core reads or writes.

diesel::table! {
    /// Processing task records.
    processing_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Task kind.
        #[max_length = 50]
        task_type -> Varchar,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Creation parameters.
        config -> Jsonb,
        /// Progress counters.
        progress -> Jsonb,
        /// Terminal payload.
        result -> Nullable<Jsonb>,
        /// Digest trigger claim timestamp.
        digest_requested_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Terminal transition timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Content sources owned by the source-management subsystem.
    content_sources (id) {
        /// Source identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Whether the source is scraped.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Per-user settings owned by the user-settings subsystem.
    user_settings (user_id) {
        /// Owning user.
        user_id -> Uuid,
        /// Timezone used for automatic digests.
        auto_digest_timezone -> Nullable<Text>,
    }
}

diesel::table! {
    /// Outbox of digest requests consumed by the digest subsystem.
    digest_requests (id) {
        /// Request identifier.
        id -> Uuid,
        /// Task whose content feeds the digest.
        task_id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Requested time range.
        #[max_length = 10]
        time_range -> Varchar,
        /// Whether the digest is built from partial results.
        partial -> Bool,
        /// Rendering timezone.
        timezone -> Text,
        /// When the request was queued.
        requested_at -> Timestamptz,
    }
}

//! Diesel table definitions.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Lower-cased login email; unique.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        /// `ciudadano` or `operador`.
        role -> Varchar,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Incident tickets.
    tickets (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        /// Category slug, e.g. `alumbrado_publico`.
        category -> Varchar,
        /// Category label; always derived from `category`.
        area_name -> Varchar,
        /// 0 to 100.
        priority -> Int2,
        /// `Alta`, `Media`, or `Baja`.
        urgency_level -> Varchar,
        /// Status slug, e.g. `in_progress`.
        status -> Varchar,
        reported_by -> Uuid,
        reporter_name -> Varchar,
        reporter_email -> Varchar,
        assigned_team -> Nullable<Varchar>,
        planned_date -> Timestamptz,
        /// Optimistic concurrency token, starting at 1.
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Evidence attached to tickets; append-only.
    ticket_evidence (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        /// URL or inline base64 image.
        image_ref -> Text,
        description -> Nullable<Text>,
        uploaded_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_evidence -> tickets (ticket_id));
diesel::joinable!(tickets -> users (reported_by));

diesel::allow_tables_to_appear_in_same_query!(users, tickets, ticket_evidence);

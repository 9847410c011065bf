use uuid::Uuid;

/// Prefixed, unique identifier such as `session_3f2a...`.
pub fn create_object_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

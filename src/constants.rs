/// The 17 item categories a hack can yield, in canonical CSV column order.
pub const ITEM_COLUMNS: [&str; 17] = [
    "L7Res", "L8Res", "L7XMP", "L8XMP", "L7US", "L8US", "L7PC", "L8PC", "Cshield", "Rshield",
    "VRShield", "AXAShield", "Else", "Cmod", "Rmod", "VRmod", "Virus",
];

/// CSV column carrying the record identifier.
pub const COL_TIMESTAMP: &str = "timestamp";

/// CSV column carrying the number of hack actions.
pub const COL_HACK_COUNT: &str = "hackCount";

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "session";

/// Default remote filename when the sync config omits one.
pub const DEFAULT_REMOTE_FILENAME: &str = "ingress_hack_data.csv";

/// Where a legacy-encoded upload is re-saved as UTF-8 (debugging aid).
pub const RECOVERY_FILE: &str = "last_uploaded_utf8.csv";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a clear-all request without explicit confirmation.
pub const ERR_CONFIRM_REQUIRED: &str = "Clearing all data requires confirm: true";

/// Error message for a sync attempt with incomplete settings.
pub const ERR_SYNC_NOT_CONFIGURED: &str = "GitHub sync is not configured";

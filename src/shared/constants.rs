/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Regular citizen - can analyze photos and submit reports
pub const ROLE_USER: &str = "user";

/// Staff member - can triage reports and manage user roles
pub const ROLE_ADMIN: &str = "admin";

/// Roles a profile may hold
pub const PROFILE_ROLES: [&str; 2] = [ROLE_USER, ROLE_ADMIN];

// =============================================================================
// ANALYSIS
// =============================================================================

/// Multipart field carrying the photo, shared by the analyze endpoint and the detector
pub const IMAGE_FIELD: &str = "image";

/// Image types accepted for analysis
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Shown when the validation policy rejects an analysis
pub const REJECTION_ADVISORY: &str =
    "Gambar tidak valid atau tidak menunjukkan kerusakan. Silakan ambil ulang foto.";

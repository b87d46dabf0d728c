//! Authentication Handlers Module
//!
//! HTTP handlers for the account endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── types.rs    - Request and response types
//! ├── session.rs  - Token + cookie response shared by sign-in flows
//! ├── signup.rs   - POST /user/signup
//! ├── verify.rs   - POST /user/verify
//! ├── login.rs    - POST /user/login
//! ├── me.rs       - GET /user/me, GET /user/logout
//! ├── profile.rs  - POST /user/edit, PUT /user/{id}/status
//! ├── password.rs - password reset
//! └── google.rs   - Google sign-in start and callback
//! ```
//!
//! # Account Flow
//!
//! 1. **Signup**: pending record created (or refreshed) and a code mailed
//! 2. **Verify**: code checked, account verified, session issued
//! 3. **Login**: password checked, session issued
//! 4. **Me**: session token resolved to the current user
//! 5. **Google**: provider proves the email, verified account found or
//!    created, session cookie set

/// Request and response types
pub mod types;

/// Shared session response
pub mod session;

pub mod signup;
pub mod verify;
pub mod login;
pub mod me;
pub mod profile;
pub mod password;
pub mod google;

pub use types::{AuthResponse, LoginRequest, SignupRequest, UserResponse, VerifyRequest};

pub use google::{google_callback, google_login};
pub use login::login;
pub use me::{get_me, logout};
pub use password::{forgot_password, reset_password};
pub use profile::{edit_profile, update_user_status};
pub use signup::signup;
pub use verify::verify_otp;

//! Authentication Module
//!
//! Account registration, email verification, sessions and authorization
//! rules.
//!
//! # Architecture
//!
//! - **`users`** - Credential store: user record and database operations
//! - **`password`** - bcrypt hashing
//! - **`verification`** - Five-digit email verification codes
//! - **`sessions`** - JWT issuing and validation
//! - **`delivery`** - Session cookie and bearer header transport
//! - **`credentials`** - Signup, login and reset-token operations
//! - **`federated`** - OAuth identity providers (Google)
//! - **`policy`** - `can(user, action, owner)` capability checks
//! - **`mailer`** - Outgoing email
//! - **`handlers`** - HTTP handlers for `/user/*`
//!
//! # Authentication Flow
//!
//! 1. **Signup**: name, email, password → pending account → code mailed
//! 2. **Verify**: email + code → account verified → session issued
//! 3. **Login**: email + password → session issued, or Google sign-in →
//!    verified account found or created → session cookie
//! 4. **Requests**: token (header or cookie) → user loaded → status checked
//!
//! # Security
//!
//! - Passwords are hashed with bcrypt (configurable cost)
//! - Sessions are stateless HS256 JWTs; logout only clears the cookie
//! - Login failures are indistinguishable (401)
//! - Account status is read on every request, not trusted from the token

pub mod credentials;
pub mod delivery;
pub mod federated;
pub mod handlers;
pub mod mailer;
pub mod password;
pub mod policy;
pub mod sessions;
pub mod users;
pub mod verification;

pub use handlers::types::{AuthResponse, LoginRequest, SignupRequest, UserResponse};
pub use federated::{FederatedProfile, GoogleProvider, IdentityProvider};
pub use mailer::{LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use password::PasswordHasher;
pub use sessions::{Claims, TokenError, TokenIssuer};
pub use users::{Role, User, UserStatus};

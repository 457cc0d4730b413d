/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the signup strength rule
/// - [`jwt`]: access / refresh tokens
/// - [`middleware`]: bearer-token axum middleware and [`middleware::AuthContext`]
/// - [`authorization`]: role and ownership checks against `profiles`
///
/// # Example
///
/// ```no_run
/// use pingtap_shared::auth::password::{hash_password, verify_password};
/// use pingtap_shared::auth::jwt::issue_token_pair;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("fibre2024")?;
/// assert!(verify_password("fibre2024", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), "a-secret-that-is-at-least-32-bytes-long")?;
/// println!("{}", tokens.access_token);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;

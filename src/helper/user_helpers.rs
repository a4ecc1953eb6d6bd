use crate::helper::validation_helpers::{self, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::models::db_operations::{posts_db_operations, users_db_operations};
use crate::models::forms::{FormErrors, RegistrationForm, UpdateUserForm};
use crate::models::{BlogPost, Pagination, User, UserSummary};
use crate::DbPool;
use rusqlite::ErrorCode;
use thiserror::Error;

pub const USERS_PER_PAGE: u32 = 10;

#[derive(Error, Debug)]
pub enum UserHelperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Not found")]
    NotFound,
    #[error("Form validation failed")]
    Invalid(FormErrors),
}

// Helper to get a connection from the pool
fn get_conn(pool: &DbPool) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, UserHelperError> {
    pool.get().map_err(UserHelperError::Pool)
}

// A concurrent request can claim a username or email between validation and
// the write; the UNIQUE constraint then reports which column collided.
fn unique_violation_to_form_errors(e: rusqlite::Error) -> UserHelperError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &e {
        if failure.code == ErrorCode::ConstraintViolation {
            let mut errors = FormErrors::default();
            if message.contains("users.email") {
                errors.add("email", EMAIL_TAKEN);
            } else if message.contains("users.username") {
                errors.add("username", USERNAME_TAKEN);
            }
            if !errors.is_empty() {
                return UserHelperError::Invalid(errors);
            }
        }
    }
    UserHelperError::Database(e)
}

/// Validates the form and creates a non-administrator account with a hashed password.
pub fn register_user(pool: &DbPool, form: &RegistrationForm, hash_cost: u32) -> Result<User, UserHelperError> {
    let conn = get_conn(pool)?;
    let errors = validation_helpers::validate_registration(&conn, form)?;
    if !errors.is_empty() {
        return Err(UserHelperError::Invalid(errors));
    }

    let hashed_password = bcrypt::hash(&form.password, hash_cost)?;
    let user_id = users_db_operations::create_user(&conn, &form.email, &form.username, &hashed_password, false)
        .map_err(unique_violation_to_form_errors)?;
    users_db_operations::read_user_by_id(&conn, user_id)?.ok_or(UserHelperError::NotFound)
}

/// Fetches one listing page. Pages below 1, and pages past the end other than
/// the first, are `NotFound`.
pub fn fetch_user_page(pool: &DbPool, page: i64) -> Result<Pagination<UserSummary>, UserHelperError> {
    if page < 1 || page > i64::from(u32::MAX) {
        return Err(UserHelperError::NotFound);
    }
    let page = page as u32;
    let conn = get_conn(pool)?;
    let total = users_db_operations::count_users(&conn)?;
    let offset = u64::from(page - 1) * u64::from(USERS_PER_PAGE);
    let users = users_db_operations::read_users_page(&conn, USERS_PER_PAGE, offset)?;
    if users.is_empty() && page != 1 {
        return Err(UserHelperError::NotFound);
    }
    Ok(Pagination::new(users, page, USERS_PER_PAGE, total))
}

/// Loads a user with the blog posts they own.
pub fn fetch_account(pool: &DbPool, user_id: i64) -> Result<(User, Vec<BlogPost>), UserHelperError> {
    let conn = get_conn(pool)?;
    let user = users_db_operations::read_user_by_id(&conn, user_id)?.ok_or(UserHelperError::NotFound)?;
    let posts = posts_db_operations::read_posts_by_user(&conn, user_id)?;
    Ok((user, posts))
}

/// Updates username and email; the password only when a new one was typed.
pub fn update_account(
    pool: &DbPool,
    user_id: i64,
    form: &UpdateUserForm,
    hash_cost: u32,
) -> Result<User, UserHelperError> {
    let conn = get_conn(pool)?;
    if users_db_operations::read_user_by_id(&conn, user_id)?.is_none() {
        return Err(UserHelperError::NotFound);
    }

    let errors = validation_helpers::validate_account_update(&conn, user_id, form)?;
    if !errors.is_empty() {
        return Err(UserHelperError::Invalid(errors));
    }

    let new_hash = match form.new_password() {
        Some(password) => Some(bcrypt::hash(password, hash_cost)?),
        None => None,
    };
    users_db_operations::update_user(&conn, user_id, &form.username, &form.email, new_hash.as_deref())
        .map_err(unique_violation_to_form_errors)?;
    users_db_operations::read_user_by_id(&conn, user_id)?.ok_or(UserHelperError::NotFound)
}

/// Deletes the user (and, through the foreign key, their posts). Returns the removed record.
pub fn delete_account(pool: &DbPool, user_id: i64) -> Result<User, UserHelperError> {
    let conn = get_conn(pool)?;
    let user = users_db_operations::read_user_by_id(&conn, user_id)?.ok_or(UserHelperError::NotFound)?;
    match users_db_operations::delete_user(&conn, user_id)? {
        0 => Err(UserHelperError::NotFound),
        _ => Ok(user),
    }
}

#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    use crate::setup::db_setup;
    // Every in-memory connection is its own database, so the pool holds exactly one.
    let manager = r2d2_sqlite::SqliteConnectionManager::memory().with_init(db_setup::enable_foreign_keys);
    let pool = r2d2::Pool::builder().max_size(1).build(manager).expect("pool");
    db_setup::setup_users_db(&mut pool.get().expect("connection")).expect("schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::validation_helpers::PASSWORD_MISMATCH;
    use crate::models::NewBlogPost;

    const COST: u32 = 4;

    fn registration(email: &str, username: &str, password: &str) -> RegistrationForm {
        RegistrationForm {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            pass_confirm: password.to_string(),
        }
    }

    fn update(email: &str, username: &str, password: &str) -> UpdateUserForm {
        UpdateUserForm {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            pass_confirm: password.to_string(),
        }
    }

    fn invalid(result: Result<User, UserHelperError>) -> FormErrors {
        match result {
            Err(UserHelperError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn registration_hashes_password_and_defaults_to_non_admin() {
        let pool = test_pool();
        let user = register_user(&pool, &registration("a@example.com", "alice", "s3cret"), COST).unwrap();
        assert!(!user.administrator);
        assert_ne!(user.password_hash, "s3cret");
        assert!(bcrypt::verify("s3cret", &user.password_hash).unwrap());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let pool = test_pool();
        register_user(&pool, &registration("a@example.com", "alice", "pw"), COST).unwrap();

        let errors = invalid(register_user(&pool, &registration("a@example.com", "alice2", "pw"), COST));
        assert!(errors.has("email"));
        let errors = invalid(register_user(&pool, &registration("b@example.com", "alice", "pw"), COST));
        assert!(errors.has("username"));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let pool = test_pool();
        let mut form = registration("a@example.com", "alice", "pw");
        form.pass_confirm = "different".to_string();
        let errors = invalid(register_user(&pool, &form, COST));
        assert_eq!(errors.get("password"), [PASSWORD_MISMATCH.to_string()]);
    }

    #[test]
    fn unique_violation_maps_to_field_error() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        users_db_operations::create_user(&conn, "a@example.com", "alice", "h", false).unwrap();
        let err = users_db_operations::create_user(&conn, "a@example.com", "bob", "h", false).unwrap_err();
        match unique_violation_to_form_errors(err) {
            UserHelperError::Invalid(errors) => assert!(errors.has("email")),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn new_user_lands_after_lower_ids_in_listing() {
        let pool = test_pool();
        register_user(&pool, &registration("a@example.com", "alice", "pw"), COST).unwrap();
        register_user(&pool, &registration("b@example.com", "bob", "pw"), COST).unwrap();
        let carol = register_user(&pool, &registration("c@example.com", "carol", "pw"), COST).unwrap();

        let page = fetch_user_page(&pool, 1).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.last().map(|u| u.id), Some(carol.id));
        assert!(page.items.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn listing_pages_and_out_of_range() {
        let pool = test_pool();
        {
            let conn = pool.get().unwrap();
            for i in 0..21 {
                users_db_operations::create_user(&conn, &format!("u{}@example.com", i), &format!("user{}", i), "h", false).unwrap();
            }
        }
        let page = fetch_user_page(&pool, 3).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pages, 3);
        assert!(!page.has_next);

        assert!(matches!(fetch_user_page(&pool, 4), Err(UserHelperError::NotFound)));
        assert!(matches!(fetch_user_page(&pool, 0), Err(UserHelperError::NotFound)));
        assert!(matches!(fetch_user_page(&pool, -2), Err(UserHelperError::NotFound)));
    }

    #[test]
    fn empty_listing_first_page_is_ok() {
        let pool = test_pool();
        let page = fetch_user_page(&pool, 1).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pages, 0);
    }

    #[test]
    fn update_without_password_preserves_hash() {
        let pool = test_pool();
        let user = register_user(&pool, &registration("a@example.com", "alice", "pw"), COST).unwrap();

        let updated = update_account(&pool, user.id, &update("new@example.com", "alice2", ""), COST).unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.password_hash, user.password_hash);

        let updated = update_account(&pool, user.id, &update("new@example.com", "alice2", "changed"), COST).unwrap();
        assert!(bcrypt::verify("changed", &updated.password_hash).unwrap());
    }

    #[test]
    fn update_to_other_users_email_is_rejected() {
        let pool = test_pool();
        let alice = register_user(&pool, &registration("a@example.com", "alice", "pw"), COST).unwrap();
        register_user(&pool, &registration("b@example.com", "bob", "pw"), COST).unwrap();

        let errors = invalid(update_account(&pool, alice.id, &update("b@example.com", "alice", ""), COST));
        assert!(errors.has("email"));
        assert!(update_account(&pool, alice.id, &update("a@example.com", "alice", ""), COST).is_ok());
    }

    #[test]
    fn missing_user_is_not_found() {
        let pool = test_pool();
        assert!(matches!(fetch_account(&pool, 7), Err(UserHelperError::NotFound)));
        assert!(matches!(update_account(&pool, 7, &update("a@example.com", "a", ""), COST), Err(UserHelperError::NotFound)));
        assert!(matches!(delete_account(&pool, 7), Err(UserHelperError::NotFound)));
    }

    #[test]
    fn delete_removes_user_and_posts() {
        let pool = test_pool();
        let user = register_user(&pool, &registration("a@example.com", "alice", "pw"), COST).unwrap();
        {
            let conn = pool.get().unwrap();
            posts_db_operations::create_post(&conn, &NewBlogPost {
                user_id: user.id,
                title: "hello",
                text: "world",
                summary: "hi",
                featured_image: None,
            }).unwrap();
        }
        let (_, posts) = fetch_account(&pool, user.id).unwrap();
        assert_eq!(posts.len(), 1);

        let deleted = delete_account(&pool, user.id).unwrap();
        assert_eq!(deleted.username, "alice");
        assert!(matches!(fetch_account(&pool, user.id), Err(UserHelperError::NotFound)));
        let conn = pool.get().unwrap();
        assert_eq!(posts_db_operations::count_posts_by_user(&conn, user.id).unwrap(), 0);
    }
}

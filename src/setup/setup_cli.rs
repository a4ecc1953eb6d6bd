use clap::{Parser, Subcommand};
use usermaint_backend::config::Config;
use usermaint_backend::helper::validation_helpers;
use usermaint_backend::models::db_operations::{posts_db_operations, users_db_operations};
use usermaint_backend::models::forms::RegistrationForm;
use usermaint_backend::models::NewBlogPost;
use usermaint_backend::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for database setup and user maintenance.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Post {
        #[command(subcommand)]
        action: PostAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Create the database file and tables if missing.
    Setup,
    /// Drop every table and create them again, empty.
    Reset,
    /// Insert the two sample accounts.
    Seed,
}

#[derive(Subcommand, Debug)]
enum UserAction {
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        admin: bool,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum PostAction {
    Create {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        featured_image: Option<String>,
    },
    List {
        #[arg(long)]
        user_id: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_database(&config),
            DbAction::Reset => reset_database(&config),
            DbAction::Seed => seed_database(&config),
        },
        Commands::User { action } => match action {
            UserAction::Create { email, username, password, admin } => {
                create_user(&config, email, username, password, *admin);
            }
            UserAction::List => list_users(&config),
        },
        Commands::Post { action } => match action {
            PostAction::Create { user_id, title, text, summary, featured_image } => {
                let post = NewBlogPost {
                    user_id: *user_id,
                    title: title.as_str(),
                    text: text.as_str(),
                    summary: summary.as_str(),
                    featured_image: featured_image.as_deref(),
                };
                create_post(&config, &post);
            }
            PostAction::List { user_id } => list_posts(&config, *user_id),
        },
    }
}

fn open_existing(config: &Config) -> Option<Connection> {
    let db_path = config.users_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match db_setup::open_connection(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening database: {}", e);
            None
        }
    }
}

fn setup_database(config: &Config) {
    let db_path = config.users_db_path();
    println!("\nSetting up database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        if let Err(e) = fs::create_dir_all(parent_dir) {
            eprintln!("❌ Error: Could not create database directory: {}", e);
            return;
        }
    }

    let mut conn = match db_setup::open_connection(&db_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Error: Could not create database file: {}", e);
            return;
        }
    };
    match db_setup::setup_users_db(&mut conn) {
        Ok(_) => println!("✅ Database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up database: {}", e),
    }
}

fn reset_database(config: &Config) {
    let Some(mut conn) = open_existing(config) else { return };
    match db_setup::reset_users_db(&mut conn) {
        Ok(_) => println!("✅ Database reset. All users and blog posts were removed."),
        Err(e) => eprintln!("❌ Error resetting database: {}", e),
    }
}

fn seed_database(config: &Config) {
    let Some(mut conn) = open_existing(config) else { return };
    match db_setup::seed_users(&mut conn, config.password_hash_cost) {
        Ok(ids) => {
            for ((_, username, _, _), id) in db_setup::SEED_USERS.iter().zip(ids) {
                println!("✅ Seeded '{}' with id {}", username, id);
            }
        }
        Err(e) => eprintln!("❌ Error seeding users: {}. They might already exist.", e),
    }
}

fn create_user(config: &Config, email: &str, username: &str, password: &str, admin: bool) {
    let Some(conn) = open_existing(config) else { return };
    let form = RegistrationForm {
        email: email.trim().to_string(),
        username: username.trim().to_string(),
        password: password.to_string(),
        pass_confirm: password.to_string(),
    };

    match validation_helpers::validate_registration(&conn, &form) {
        Ok(errors) if !errors.is_empty() => {
            for field in ["email", "username", "password"] {
                for message in errors.get(field) {
                    eprintln!("❌ {}: {}", field, message);
                }
            }
            return;
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("❌ Error validating user: {}", e);
            return;
        }
    }

    let hashed_password = match bcrypt::hash(&form.password, config.password_hash_cost) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("❌ Error hashing password: {}", e);
            return;
        }
    };
    match users_db_operations::create_user(&conn, &form.email, &form.username, &hashed_password, admin) {
        Ok(id) => println!("✅ User '{}' created with id {}.", form.username, id),
        Err(e) => eprintln!("❌ Error creating user: {}", e),
    }
}

fn list_users(config: &Config) {
    let Some(conn) = open_existing(config) else { return };
    match users_db_operations::read_all_users(&conn) {
        Ok(users) => {
            println!("Listing Users:");
            for user in users {
                let marker = if user.administrator { " [admin]" } else { "" };
                println!("- {:>4}  {}  <{}>{}", user.id, user.username, user.email, marker);
            }
        }
        Err(e) => eprintln!("❌ Error fetching users: {}", e),
    }
}

fn create_post(config: &Config, post: &NewBlogPost) {
    let Some(conn) = open_existing(config) else { return };
    match posts_db_operations::create_post(&conn, post) {
        Ok(id) => println!("✅ Post '{}' created with id {}.", post.title, id),
        Err(e) => eprintln!("❌ Error creating post: {}. Does user {} exist?", e, post.user_id),
    }
}

fn list_posts(config: &Config, user_id: i64) {
    let Some(conn) = open_existing(config) else { return };
    let author = match users_db_operations::read_user_by_id(&conn, user_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            eprintln!("❌ Error: No user with id {}.", user_id);
            return;
        }
        Err(e) => {
            eprintln!("❌ Error fetching user: {}", e);
            return;
        }
    };
    match posts_db_operations::read_posts_by_user(&conn, user_id) {
        Ok(posts) => {
            println!("Posts by {}:", author.username);
            for post in posts {
                println!("- PostID:{}, Title:{}, Date:{}", post.id, post.title, post.date.to_rfc3339());
            }
        }
        Err(e) => eprintln!("❌ Error fetching posts: {}", e),
    }
}

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use lestari::cli::create_admin;
use lestari::lestari_config::ServerConfig;
use lestari::lestari_db::{init_db_pool, run_migrations};
use lestari::store::PostgresStore;

#[derive(Parser)]
#[command(name = "lestari-cli")]
#[command(about = "Lestari CLI - Administrative tools for the Lestari API", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: String,

        /// Email address
        #[arg(short = 'e', long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Password (at least 8 characters)
        #[arg(short = 'p', long, env = "ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let pool = init_db_pool(&cli.database_url).await?;
    run_migrations(&pool).await?;
    let store = PostgresStore::new(pool, ServerConfig::from_env().bcrypt_cost);

    match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            phone,
            password,
        } => match create_admin(&store, &name, &email, &phone, &password).await {
            Ok(admin) => {
                println!("\n✅ Admin created successfully!");
                println!("   Email: {}", admin.email);
                println!("   Name: {}", admin.name);
            }
            Err(e) => {
                eprintln!("\n❌ Error creating admin: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

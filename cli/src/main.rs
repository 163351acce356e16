use std::io::{Error, ErrorKind};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use mestre::Config;
use mestre::backend::RestBackend;
use mestre::error::AppResult;
use mestre::model::entity::{Lesson, LessonCreate, Module, ModuleCreate, Profile, Role};
use mestre::model::{CrudRepository, ModelManager};
use mestre::player::{Embed, embed};
use mestre::web::AuthenticatedUser;
use uuid::Uuid;

/// Key that bypasses row-level rules, the CLI acts with it instead of a user session.
const SERVICE_KEY_ENV: &str = "MESTRE_SERVICE_KEY";

#[derive(Parser, Debug)]
#[command(about = "CLI tool for managing the course content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage user roles
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Video URL helpers, no backend needed
    Embed {
        #[command(subcommand)]
        action: EmbedCommands,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
        #[arg(long, default_value_t = false)]
        locked: bool,
    },
    List,
    /// Flip the lock flag of a module
    Lock {
        #[arg(long)]
        title: String,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Module title to attach the lesson to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        video_url: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        pdf_url: Option<String>,
    },
    List {
        #[arg(long)]
        module_title: String,
    },
}

/// Role management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Role {
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    Student,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Student => Role::Student,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum EmbedCommands {
    /// Print the player source a lesson with this video URL would use
    Resolve { url: String },
}

fn not_found(what: String) -> Error {
    Error::new(ErrorKind::NotFound, what)
}

async fn module_by_title(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    title: &str,
) -> AppResult<Module> {
    Module::find_by_title(mm, actor, title)
        .await?
        .ok_or_else(|| not_found(format!("no module titled {title:?}")).into())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    if let Commands::Embed { action } = &args.command {
        let EmbedCommands::Resolve { url } = action;
        match embed::resolve(url) {
            Embed::Empty => println!("no video"),
            Embed::Frame { src } => println!("frame: {src}"),
            Embed::External { href } => println!("external link: {href}"),
        }
        return Ok(());
    }

    let config = Config::load(cfg!(debug_assertions))?;
    let service_key = std::env::var(SERVICE_KEY_ENV)
        .map_err(|_| not_found(format!("{SERVICE_KEY_ENV} is not set")))?;

    let mm = ModelManager::new(Arc::new(RestBackend::from_config(&config)));
    let actor = AuthenticatedUser::service(service_key);

    match args.command {
        Commands::Module { action } => match action {
            ModuleCommands::Add { title, image_url, order_index, locked } => {
                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        title,
                        image_url,
                        is_locked: locked,
                        order_index,
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
            ModuleCommands::List => {
                for module in Module::list(&mm, &actor).await? {
                    let lock = if module.is_locked() { " [locked]" } else { "" };
                    println!("{}  {}  {}{}", module.label(), module.id(), module.title(), lock);
                }
            }
            ModuleCommands::Lock { title } => {
                let module = module_by_title(&mm, &actor, &title).await?;
                let locked = !module.is_locked();
                let module = module.set_locked(&mm, &actor, locked).await?;
                println!("Module {:?} locked: {}", module.title(), module.is_locked());
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { module_title, title, video_url, description, pdf_url } => {
                let module = module_by_title(&mm, &actor, &module_title).await?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id: module.id(),
                        title,
                        video_url,
                        description,
                        pdf_url,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
            LessonCommands::List { module_title } => {
                let module = module_by_title(&mm, &actor, &module_title).await?;
                for lesson in Lesson::all_by_module(&mm, &actor, module.id()).await? {
                    println!("{}  {}  {}", lesson.id(), lesson.title(), lesson.video_url());
                }
            }
        },

        Commands::User { action } => match action {
            UserCommands::Role { id, role } => {
                let profile = Profile::find_by_id(&mm, &actor, id)
                    .await?
                    .ok_or_else(|| not_found(format!("no profile with id {id}")))?;
                let profile = profile.set_role(&mm, &actor, role.into()).await?;
                println!("Profile {} is now {}", profile.id(), profile.role());
            }
        },

        Commands::Embed { .. } => {}
    }

    Ok(())
}

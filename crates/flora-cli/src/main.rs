//! Flora storefront client CLI.
//!
//! Provides the `flora` binary for driving the cart, checkout, favorites
//! and sessions against a SQLite file. The file holds both storage
//! namespaces: the cart, favorites and customer session live in `local`,
//! the admin session and the order log in `session`.
//!
//! Configuration comes from `FLORA_*` environment variables (see
//! `flora_shop::config`); `--db` and `--api-url` override them.
//!
//! Exit codes: 0 = success, 1 = usage or validation error, 2 = backend
//! error, 3 = storage or I/O error.

use std::fmt;
use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use flora_core::{CatalogItem, CheckoutForm, CoreError, FlowerId, Money, OrderId, User};
use flora_shop::{
    checkout, Access, AdminSession, CartStore, FavoritesStore, GatewayError, OrderLog, OrderStatus,
    Receipt, RestGateway, ShopConfig, ShopError, UserSession,
};
use flora_storage::{KeyValueStore, Namespace, SqliteStore, StorageError};

/// Flora storefront client.
#[derive(Parser)]
#[command(name = "flora", about = "Flora storefront client")]
struct Cli {
    /// Path to the storage database file.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Backend base URL; `/api` is appended when missing.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),

    /// Place the cart as an order.
    Checkout {
        #[arg(long, default_value = "")]
        first_name: String,

        /// Telegram username to contact the customer on.
        #[arg(long, default_value = "")]
        telegram: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Delivery address.
        #[arg(long, default_value = "")]
        address: String,

        /// Write the receipt to a file instead of stdout. Without a path the
        /// file is `order_<placement millis>.txt` in the current directory.
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        receipt: Option<Option<PathBuf>>,
    },

    /// Liked flowers of the logged-in customer.
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Orders placed from this client.
    #[command(subcommand)]
    Orders(OrdersCommand),

    /// Back-office session.
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Customer session.
    #[command(subcommand)]
    User(UserCommand),

    /// List the keys stored in a namespace.
    Keys {
        #[arg(long, default_value = "local")]
        namespace: Namespace,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Add one unit of a flower.
    Add {
        /// Flower id.
        id: String,

        #[arg(long)]
        name: String,

        /// Unit price as a decimal string, e.g. 10000 or 12.50.
        #[arg(long, default_value = "0")]
        price: String,

        /// Image URL shown next to the line.
        #[arg(long)]
        image: Option<String>,
    },

    /// Remove a line.
    Remove { id: String },

    /// Set a line's quantity; zero or less removes it.
    Set {
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Increase a line's quantity.
    Inc {
        id: String,

        #[arg(long, default_value_t = 1)]
        by: u32,
    },

    /// Decrease a line's quantity, removing it at zero.
    Dec {
        id: String,

        #[arg(long, default_value_t = 1)]
        by: u32,
    },

    /// Remove every line.
    Clear,

    /// Print the cart.
    Show {
        /// Print the stored line items as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// List liked flower ids.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Like or unlike a flower.
    Toggle { id: String },
}

#[derive(Subcommand)]
enum OrdersCommand {
    /// List placed orders, newest first.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Change an order's status (pending, processing, completed, cancelled).
    Status { id: String, status: String },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Store a token issued by the admin login endpoint.
    Login { token: String },
    Logout,
    Status,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Store the customer returned by the login endpoint.
    Login {
        #[arg(long)]
        id: String,

        #[arg(long)]
        token: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },
    Logout,
    Status,
}

/// Why a command failed; decides the exit code.
#[derive(Debug)]
enum Failure {
    Shop(ShopError),
    Usage(String),
    Io(std::io::Error),
    /// The command ran but its result could not be written to storage.
    NotDurable(&'static str),
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Usage(_) => 1,
            Failure::Shop(ShopError::Gateway(_)) => 2,
            Failure::Shop(ShopError::Storage(_)) | Failure::Io(_) | Failure::NotDurable(_) => 3,
            Failure::Shop(_) => 1,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Shop(e) => write!(f, "{}", e),
            Failure::Usage(msg) => f.write_str(msg),
            Failure::Io(e) => write!(f, "I/O error: {}", e),
            Failure::NotDurable(what) => write!(f, "{} changed but could not be saved", what),
        }
    }
}

impl From<ShopError> for Failure {
    fn from(e: ShopError) -> Self {
        Failure::Shop(e)
    }
}

impl From<StorageError> for Failure {
    fn from(e: StorageError) -> Self {
        Failure::Shop(e.into())
    }
}

impl From<CoreError> for Failure {
    fn from(e: CoreError) -> Self {
        Failure::Shop(e.into())
    }
}

impl From<GatewayError> for Failure {
    fn from(e: GatewayError) -> Self {
        Failure::Shop(e.into())
    }
}

type CliResult = Result<(), Failure>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match load_config(cli.db, cli.api_url) {
        Ok(config) => match run(&config, cli.command) {
            Ok(()) => 0,
            Err(e) => report(e),
        },
        Err(e) => report(e),
    };
    process::exit(exit_code);
}

fn report(failure: Failure) -> i32 {
    eprintln!("Error: {}", failure);
    failure.exit_code()
}

fn load_config(db: Option<String>, api_url: Option<String>) -> Result<ShopConfig, Failure> {
    let mut config = ShopConfig::from_env()?;
    if let Some(db) = db {
        config.db_path = db;
    }
    if let Some(api_url) = api_url {
        config = config.with_api_url(&api_url)?;
    }
    Ok(config)
}

fn open(config: &ShopConfig, namespace: Namespace) -> Result<SqliteStore, StorageError> {
    SqliteStore::new(&config.db_path, namespace)
}

fn run(config: &ShopConfig, command: Commands) -> CliResult {
    match command {
        Commands::Cart(command) => run_cart(config, command),
        Commands::Checkout {
            first_name,
            telegram,
            phone,
            address,
            receipt,
        } => {
            let form = CheckoutForm {
                first_name,
                telegram_username: telegram,
                phone_number: phone,
                address,
            };
            run_checkout(config, &form, receipt)
        }
        Commands::Favorites(command) => run_favorites(config, command),
        Commands::Orders(command) => run_orders(config, command),
        Commands::Admin(command) => run_admin(config, command),
        Commands::User(command) => run_user(config, command),
        Commands::Keys { namespace } => {
            for key in open(config, namespace)?.keys()? {
                println!("{}", key);
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// cart
// ---------------------------------------------------------------------------

fn run_cart(config: &ShopConfig, command: CartCommand) -> CliResult {
    let mut cart = CartStore::open(open(config, Namespace::Local)?);

    match command {
        CartCommand::Add {
            id,
            name,
            price,
            image,
        } => {
            let price = Money::parse(&price)?;
            let mut item = CatalogItem::new(id, name, price);
            if let Some(image) = image {
                item = item.with_image(image);
            }
            cart.add_item(item);
        }
        CartCommand::Remove { id } => cart.remove_item(&id),
        CartCommand::Set { id, quantity } => cart.set_quantity(&id, quantity),
        CartCommand::Inc { id, by } => cart.adjust_quantity(&id, i64::from(by)),
        CartCommand::Dec { id, by } => cart.adjust_quantity(&id, -i64::from(by)),
        CartCommand::Clear => cart.clear(),
        CartCommand::Show { json } => {
            if json {
                let text = serde_json::to_string_pretty(&cart.snapshot())
                    .map_err(StorageError::from)?;
                println!("{}", text);
            } else {
                print_cart(&cart, &config.currency);
            }
            return Ok(());
        }
    }

    if !cart.is_durable() {
        return Err(Failure::NotDurable("cart"));
    }
    print_cart(&cart, &config.currency);
    Ok(())
}

fn print_cart(cart: &CartStore<SqliteStore>, currency: &str) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in cart.items() {
        println!(
            "{:>3} x {} ({}) @ {} = {} {}",
            line.quantity,
            line.name,
            line.id,
            line.price.grouped(),
            line.subtotal().grouped(),
            currency
        );
    }
    println!(
        "Items: {}  Total: {} {}",
        cart.item_count(),
        cart.total().grouped(),
        currency
    );
}

// ---------------------------------------------------------------------------
// checkout
// ---------------------------------------------------------------------------

fn run_checkout(
    config: &ShopConfig,
    form: &CheckoutForm,
    receipt: Option<Option<PathBuf>>,
) -> CliResult {
    let mut session = open(config, Namespace::Session)?;
    let mut log = OrderLog::load(&session)?;
    let mut cart = CartStore::open(open(config, Namespace::Local)?);
    let mut gateway = RestGateway::new(config.api_url.clone())?;

    let order = checkout::submit(&mut cart, form, &mut gateway, &mut log)?;

    // The order exists on the backend from here on; local failures only warn.
    if let Err(e) = log.save(&mut session) {
        warn!(order = %order.id, error = %e, "order placed but not added to the local log");
    }
    if !cart.is_durable() {
        warn!(order = %order.id, "order placed but the emptied cart could not be saved");
    }

    let receipt_doc = Receipt::new(&order, config);
    let text = receipt_doc.to_string();
    match receipt {
        Some(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(receipt_doc.file_name()));
            std::fs::write(&path, text).map_err(Failure::Io)?;
            println!(
                "Order {} placed, total {} {}. Receipt written to {}",
                order.id,
                order.total.grouped(),
                config.currency,
                path.display()
            );
        }
        None => print!("{}", text),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// favorites
// ---------------------------------------------------------------------------

fn run_favorites(config: &ShopConfig, command: FavoritesCommand) -> CliResult {
    let mut local = open(config, Namespace::Local)?;

    match command {
        FavoritesCommand::List { json } => {
            let favorites = FavoritesStore::open(&mut local);
            let ids: Vec<&FlowerId> = favorites.liked().collect();
            if json {
                let text = serde_json::to_string_pretty(&ids).map_err(StorageError::from)?;
                println!("{}", text);
            } else if ids.is_empty() {
                println!("No favorites yet");
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
            Ok(())
        }
        FavoritesCommand::Toggle { id } => {
            let (user_id, token) = {
                let session = UserSession::open(&mut local);
                if let Access::Redirect(route) = session.guard() {
                    return Err(Failure::Usage(format!(
                        "not logged in; log in first ({})",
                        config.page_url(route)
                    )));
                }
                match (session.user(), session.token()) {
                    (Some(user), Some(token)) => (user.id.clone(), token.to_string()),
                    _ => return Err(ShopError::NotLoggedIn.into()),
                }
            };

            let mut gateway = RestGateway::new(config.api_url.clone())?.with_token(Some(token));
            let flower = FlowerId::from(id);
            let outcome = FavoritesStore::open(&mut local).toggle(&flower, &user_id, &mut gateway);

            match outcome {
                Ok(liked) => {
                    println!("{} {}", flower, if liked { "liked" } else { "unliked" });
                    Ok(())
                }
                Err(ShopError::Gateway(e)) if e.is_unauthorized() => {
                    UserSession::open(&mut local).invalidate()?;
                    Err(Failure::Usage(format!(
                        "session expired, log in again ({})",
                        e
                    )))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// orders
// ---------------------------------------------------------------------------

fn run_orders(config: &ShopConfig, command: OrdersCommand) -> CliResult {
    let mut session = open(config, Namespace::Session)?;
    let mut log = OrderLog::load(&session)?;

    match command {
        OrdersCommand::List { json } => {
            if json {
                let text = serde_json::to_string_pretty(&log).map_err(StorageError::from)?;
                println!("{}", text);
                return Ok(());
            }
            if log.is_empty() {
                println!("No orders yet");
            }
            for order in log.orders() {
                println!(
                    "{}  {}  {:<10}  {} item(s)  {} {}  {}",
                    order.id,
                    order.placed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    order.status,
                    order.item_count(),
                    order.total.grouped(),
                    config.currency,
                    order.customer.name
                );
            }
            Ok(())
        }
        OrdersCommand::Status { id, status } => {
            let status: OrderStatus = status.parse().map_err(Failure::Usage)?;
            let id = OrderId::from(id);
            if !log.update_status(&id, status) {
                return Err(Failure::Usage(format!("no order with id {}", id)));
            }
            log.save(&mut session)?;
            println!("Order {} is now {}", id, status);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// sessions
// ---------------------------------------------------------------------------

fn run_admin(config: &ShopConfig, command: AdminCommand) -> CliResult {
    let mut session = AdminSession::open(open(config, Namespace::Session)?);

    match command {
        AdminCommand::Login { token } => {
            session.login(token)?;
            println!("Admin logged in");
        }
        AdminCommand::Logout => {
            session.logout()?;
            println!("Admin logged out");
        }
        AdminCommand::Status => match session.guard() {
            Access::Granted => println!("Admin: authenticated"),
            Access::Redirect(route) => println!(
                "Admin: not authenticated (login at {})",
                config.page_url(route)
            ),
        },
    }
    Ok(())
}

fn run_user(config: &ShopConfig, command: UserCommand) -> CliResult {
    let mut session = UserSession::open(open(config, Namespace::Local)?);

    match command {
        UserCommand::Login {
            id,
            token,
            first_name,
            last_name,
            phone,
        } => {
            let user = User {
                first_name,
                last_name,
                phone_number: phone,
                ..User::new(id)
            };
            let name = user.display_name();
            session.login(user, token)?;
            println!("Logged in as {}", name);
        }
        UserCommand::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        UserCommand::Status => match (session.guard(), session.user()) {
            (Access::Granted, Some(user)) => println!("User: {} ({})", user.display_name(), user.id),
            _ => println!(
                "User: not logged in (login at {})",
                config.page_url(flora_shop::session::USER_LOGIN_ROUTE)
            ),
        },
    }
    Ok(())
}

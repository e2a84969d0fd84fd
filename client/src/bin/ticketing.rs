//! ticketing CLI
//!
//! Drives the private ticketing program from a terminal.
//!
//! ## Usage
//! ```bash
//! # One-time registry setup
//! ticketing --keypair ~/.config/solana/id.json --arcium-manifest arcium.json init
//!
//! # Organizer: create an event and open it to everyone
//! ticketing ... create-event --name "Concert" --price 50 --supply 100 --days 30
//! ticketing ... grant-purchase --event-id 1
//!
//! # Buyer
//! ticketing ... purchase --event-id 1
//! ticketing ... price --ticket-id 1
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use private_ticketing::constants::OP_PURCHASE_TICKET;
use solana_sdk::pubkey::Pubkey;
use ticketing_client::{
    ClientConfig, Ledger, NewEvent, PermissionGrant, TicketingApi, TicketingClient,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ticketing")]
#[command(about = "Confidential event ticketing on Solana + Arcium", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the registry (run once per deployment)
    Init {
        /// MXE program; defaults to the manifest's
        #[arg(long)]
        mxe_program: Option<Pubkey>,
    },

    /// Create an event with an encrypted price, supply and markup
    CreateEvent {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: u64,

        #[arg(short, long)]
        supply: u64,

        /// Days from now until the event
        #[arg(short, long, default_value_t = 30)]
        days: i64,

        /// Markup percent applied to resale quotes; enables resale
        #[arg(short, long)]
        markup: Option<u64>,
    },

    /// Allow purchases for one of your events
    GrantPurchase {
        #[arg(short, long)]
        event_id: u64,

        /// Buyer to allow; every buyer when omitted
        #[arg(short, long)]
        caller: Option<Pubkey>,
    },

    /// Buy a ticket
    Purchase {
        #[arg(short, long)]
        event_id: u64,
    },

    /// Prove you hold a ticket
    Prove {
        #[arg(short, long)]
        ticket_id: u64,
    },

    /// Reveal what you paid for a ticket
    Price {
        #[arg(short, long)]
        ticket_id: u64,
    },

    /// Quote the resale price of a ticket
    Quote {
        #[arg(short, long)]
        ticket_id: u64,
    },

    /// Reveal how many tickets your event has sold
    Sales {
        #[arg(short, long)]
        event_id: u64,
    },

    /// Release an event whose purchase computation never came back
    ClearStale {
        #[arg(short, long)]
        event_id: u64,
    },

    /// Hand a ticket to someone else
    Transfer {
        #[arg(short, long)]
        ticket_id: u64,

        #[arg(long)]
        to: Pubkey,
    },

    /// List the tickets you hold
    MyTickets,

    /// Show an event's public fields
    Event {
        #[arg(short, long)]
        event_id: u64,
    },

    /// Show a ticket's public fields
    Ticket {
        #[arg(short, long)]
        ticket_id: u64,
    },

    /// Show a lamport balance
    Balance { address: Option<Pubkey> },

    /// Create, open, buy, count and transfer in one go
    Demo {
        /// Receiver of the demo ticket
        #[arg(long)]
        recipient: Pubkey,
    },
}

fn unix_now() -> anyhow::Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

fn purchase_grant(event_id: u64, caller: Option<Pubkey>) -> PermissionGrant {
    PermissionGrant {
        caller: caller.map(|c| c.to_string()),
        operation: OP_PURCHASE_TICKET.to_string(),
        active: true,
        uint_parameter: event_id,
        scope_event: Some(event_id),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let client = cli.config.connect().context("failed to set up client")?;
    println!(
        "{} {} on {}",
        "Wallet:".cyan(),
        client.wallet(),
        cli.config.chain
    );

    match cli.command {
        Commands::Init { mxe_program } => {
            let signature = client.initialize(mxe_program).await?;
            println!("{} {}", "Registry initialized:".green(), signature);
        }

        Commands::CreateEvent {
            name,
            price,
            supply,
            days,
            markup,
        } => {
            println!("{}", "Encrypting event parameters...".cyan());
            let event = TicketingApi::create_event(
                &client,
                NewEvent {
                    name,
                    event_date: unix_now()? + days * 86_400,
                    price,
                    supply,
                    resale_allowed: markup.is_some(),
                    resale_markup_percent: markup.unwrap_or_default(),
                },
            )
            .await?;
            println!("{} {} ({})", "Event created:".green(), event.id, event.name);
        }

        Commands::GrantPurchase { event_id, caller } => {
            TicketingApi::set_permission(&client, purchase_grant(event_id, caller)).await?;
            let who = caller.map_or("everyone".to_string(), |c| c.to_string());
            println!("{} event {} open to {}", "✓".green(), event_id, who);
        }

        Commands::Purchase { event_id } => {
            println!("{}", "Waiting for the MXE to check supply...".cyan());
            let ticket = TicketingApi::purchase_ticket(&client, event_id).await?;
            println!("{} {}", "Ticket purchased:".green(), ticket.id);
        }

        Commands::Prove { ticket_id } => {
            if TicketingApi::prove_ownership(&client, ticket_id).await? {
                println!("  {} ticket {} is yours", "✓".green(), ticket_id);
            } else {
                println!("  {} proof did not open to ticket {}", "✗".red(), ticket_id);
            }
        }

        Commands::Price { ticket_id } => {
            let price = client.ticket_price(ticket_id).await?;
            println!("{} {}", "Price paid:".green(), price);
        }

        Commands::Quote { ticket_id } => {
            let quote = client.resale_quote(ticket_id).await?;
            println!("{} {}", "Resale quote:".green(), quote);
        }

        Commands::Sales { event_id } => {
            let sold = client.sales_count(event_id).await?;
            println!("{} {}", "Tickets sold:".green(), sold);
        }

        Commands::ClearStale { event_id } => {
            let ticket_id = client.clear_stale_purchase(event_id).await?;
            println!(
                "{} event {} released, ticket {} rejected",
                "✓".green(),
                event_id,
                ticket_id
            );
        }

        Commands::Transfer { ticket_id, to } => {
            let ticket = TicketingApi::transfer_ticket(&client, ticket_id, to).await?;
            println!(
                "{} ticket {} now held by {}",
                "✓".green(),
                ticket.id,
                ticket.owner
            );
        }

        Commands::MyTickets => {
            let ids = client.get_my_ticket_ids().await?;
            if ids.is_empty() {
                println!("{}", "No tickets".yellow());
            }
            for id in ids {
                println!("  • {}", id);
            }
        }

        Commands::Event { event_id } => match TicketingApi::event(&client, event_id).await? {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("{} event {}", "Not found:".yellow(), event_id),
        },

        Commands::Ticket { ticket_id } => match TicketingApi::ticket(&client, ticket_id).await? {
            Some(ticket) => println!("{}", serde_json::to_string_pretty(&ticket)?),
            None => println!("{} ticket {}", "Not found:".yellow(), ticket_id),
        },

        Commands::Balance { address } => {
            let address = address.unwrap_or_else(|| client.wallet());
            let lamports = client.ledger().balance(&address).await?;
            println!("{} {} lamports", "Balance:".green(), lamports);
        }

        Commands::Demo { recipient } => run_demo(&client, recipient).await?,
    }

    Ok(())
}

async fn run_demo<L: Ledger>(client: &TicketingClient<L>, recipient: Pubkey) -> anyhow::Result<()> {
    let wallet = client.wallet();

    println!("{}", "1. Creating event (price 50, supply 100)...".cyan());
    let event = TicketingApi::create_event(
        client,
        NewEvent {
            name: "Demo Concert".into(),
            event_date: unix_now()? + 30 * 86_400,
            price: 50,
            supply: 100,
            resale_allowed: true,
            resale_markup_percent: 10,
        },
    )
    .await?;
    println!("   event {}", event.id);

    println!("{}", "2. Opening sales to the organizer...".cyan());
    TicketingApi::set_permission(client, purchase_grant(event.id, Some(wallet))).await?;

    println!("{}", "3. Purchasing...".cyan());
    let ticket = TicketingApi::purchase_ticket(client, event.id).await?;
    println!("   ticket {}", ticket.id);

    let price = client.ticket_price(ticket.id).await?;
    println!("   paid {}", price);

    let sold = client.sales_count(event.id).await?;
    println!("{} {}", "4. Tickets sold:".cyan(), sold);

    println!("{}", "5. Transferring...".cyan());
    TicketingApi::transfer_ticket(client, ticket.id, recipient).await?;

    println!("   {}: {:?}", wallet, client.tickets_of(&wallet).await?);
    println!("   {}: {:?}", recipient, client.tickets_of(&recipient).await?);
    println!("{}", "Demo complete".green());
    Ok(())
}

//! Subcommand surface mapping the app's routes onto the terminal: `chains`,
//! `create`, `link`, `links`, `history`, and `fund`.

use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::json;

use client_app::config::AppConfig;
use client_app::flows::create::CreateCampaignFlow;
use client_app::flows::links::owner_links;
use client_app::flows::redeem::RedemptionFlow;
use client_app::history::{daily_counts, HistoryClient};
use xefers::campaign::CampaignDraft;
use xefers::chains;
use xefers::errors::{FailureClass, XefersError, WALLET_PROMPT};
use xefers::redemption::RedemptionState;
use xefers_contract::LinkContractGateway;
use xefers_store::CollectionClient;
use xefers_wallet::provider::HttpProvider;
use xefers_wallet::session::WalletSession;

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FORMAT")
        .help("Output format")
        .value_parser(["text", "json"])
        .default_value("text")
}

fn command() -> Command {
    Command::new("xefers")
        .version("1.0")
        .about(xefers::APP_DESC)
        .subcommand_required(true)
        .subcommand(
            Command::new("chains")
                .about("List supported networks")
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("create")
                .about("Deploy a referral link contract and register the campaign")
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .help("Campaign title")
                        .required(true),
                )
                .arg(
                    Arg::new("url")
                        .short('u')
                        .long("url")
                        .value_name("URL")
                        .help("Destination visitors are redirected to")
                        .required(true),
                )
                .arg(
                    Arg::new("reward")
                        .short('r')
                        .long("reward")
                        .value_name("AMOUNT")
                        .help("Reward per referral, in native units")
                        .default_value("0"),
                )
                .arg(
                    Arg::new("no-reward")
                        .long("no-reward")
                        .action(ArgAction::SetTrue)
                        .help("Record the campaign with rewards disabled"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("link")
                .about("Open a referral link page; --redeem submits the referral")
                .arg(
                    Arg::new("contract")
                        .value_name("CONTRACT_ADDRESS")
                        .help("Link contract address from the shared URL")
                        .required(true),
                )
                .arg(
                    Arg::new("redeem")
                        .long("redeem")
                        .action(ArgAction::SetTrue)
                        .help("Submit the on-chain refer call"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("links")
                .about("List campaigns owned by the connected account")
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("Per-day transaction counts for an address")
                .arg(
                    Arg::new("address")
                        .value_name("ADDRESS")
                        .help("Account to chart")
                        .required(true),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("fund")
                .about("Fund a deployed link contract with its reward balance")
                .arg(
                    Arg::new("contract")
                        .value_name("CONTRACT_ADDRESS")
                        .required(true),
                )
                .arg(
                    Arg::new("amount")
                        .value_name("AMOUNT")
                        .help("Amount to transfer, in native units")
                        .required(true),
                ),
        )
}

/// app cli
pub struct Cli;

impl Cli {
    /// start the xefers cli
    ///
    /// # Panics
    ///
    /// Panics if the async runtime cannot be started.
    pub fn execute() {
        let matches = command().get_matches();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to start async runtime");
        runtime.block_on(dispatch(&matches));
    }
}

async fn dispatch(matches: &ArgMatches) {
    let config = AppConfig::from_env();
    match matches.subcommand() {
        Some(("chains", sub)) => run_chains(sub),
        Some(("create", sub)) => run_create(&config, sub).await,
        Some(("link", sub)) => run_link(&config, sub).await,
        Some(("links", sub)) => run_links(&config, sub).await,
        Some(("history", sub)) => run_history(&config, sub).await,
        Some(("fund", sub)) => run_fund(&config, sub).await,
        _ => unreachable!("subcommand is required"),
    }
}

fn output_format(sub: &ArgMatches) -> &str {
    sub.get_one::<String>("output")
        .map_or("text", String::as_str)
}

fn session_for(config: &AppConfig) -> Arc<WalletSession<HttpProvider>> {
    Arc::new(WalletSession::new(config.rpc_endpoint().map(HttpProvider::new)))
}

fn store_for(config: &AppConfig) -> CollectionClient {
    CollectionClient::new(
        config.store_base_url.clone(),
        &config.store_namespace,
        &config.store_collection,
    )
}

async fn ensure_account(
    session: &Arc<WalletSession<HttpProvider>>,
) -> Result<String, XefersError> {
    if let Some(account) = session.account() {
        return Ok(account);
    }
    if let Some(account) = session.check_connected().await? {
        return Ok(account);
    }
    session.connect().await
}

fn run_chains(sub: &ArgMatches) {
    let table = chains::supported_chains();
    if output_format(sub) == "json" {
        match serde_json::to_string_pretty(table) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error: {e}"),
        }
        return;
    }
    for chain in table {
        println!(
            "{:>6}  {}  ({}, {})",
            chain.id,
            chain.name,
            chain.symbol,
            chains::to_network_handle(chain.id)
        );
    }
}

async fn run_create(config: &AppConfig, sub: &ArgMatches) {
    let Some(chain) = config.chain() else {
        eprintln!("Error: chain {} is not a supported network", config.chain_id);
        return;
    };
    let draft = CampaignDraft {
        title: sub
            .get_one::<String>("title")
            .expect("title is required")
            .clone(),
        redirect_url: sub.get_one::<String>("url").expect("url is required").clone(),
        reward: sub
            .get_one::<String>("reward")
            .expect("reward has a default value")
            .clone(),
        reward_checked: !sub.get_flag("no-reward"),
    };

    let session = session_for(config);
    if let Err(e) = ensure_account(&session).await {
        eprintln!("Error: {e}");
        return;
    }
    let gateway = LinkContractGateway::new(Arc::clone(&session));
    let store = store_for(config);
    let flow = CreateCampaignFlow::new(
        Arc::clone(&session),
        gateway,
        store,
        chain,
        config.public_origin.clone(),
    );

    match flow.run(&draft).await {
        Ok(receipt) => {
            if output_format(sub) == "json" {
                match serde_json::to_string_pretty(&receipt) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
                return;
            }
            println!("Campaign \"{}\" is live.", receipt.campaign.title);
            println!("Share this URL: {}", receipt.share_link);
            println!("Contract: {}", receipt.contract_url);
            if !receipt.persisted {
                println!(
                    "Note: the campaign record could not be saved; the link itself still works."
                );
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

async fn run_link(config: &AppConfig, sub: &ArgMatches) {
    let contract = sub
        .get_one::<String>("contract")
        .expect("contract is required");
    let session = session_for(config);
    // Probe first, prompt once if nothing is exposed. A missing wallet or a
    // declined prompt leaves the page in its explanatory unauthenticated
    // state rather than failing the command.
    match session.check_connected().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Err(e) = session.connect().await {
                match e {
                    XefersError::NoWalletProvider | XefersError::UserRejected => {}
                    other => {
                        eprintln!("Error: {other}");
                        return;
                    }
                }
            }
        }
        Err(XefersError::NoWalletProvider) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    }
    let gateway = LinkContractGateway::new(Arc::clone(&session));
    let flow = RedemptionFlow::new(Arc::clone(&session), gateway);

    let mut page = flow.open(contract).await;
    let destination = if sub.get_flag("redeem") {
        flow.continue_pressed(&mut page).await
    } else {
        None
    };

    if output_format(sub) == "json" {
        println!("{}", render_page_json(page.state(), destination.as_deref()));
        return;
    }
    render_page_text(page.state(), destination.as_deref());
}

fn render_page_json(state: &RedemptionState, destination: Option<&str>) -> String {
    let value = match state {
        RedemptionState::Unauthenticated => json!({ "state": "unauthenticated", "message": WALLET_PROMPT }),
        RedemptionState::Loading => json!({ "state": "loading" }),
        RedemptionState::Ready { metadata } => json!({ "state": "ready", "metadata": metadata }),
        RedemptionState::Redeeming { metadata } => {
            json!({ "state": "redeeming", "metadata": metadata })
        }
        RedemptionState::Redeemed { metadata, destination } => {
            json!({ "state": "redeemed", "metadata": metadata, "destination": destination })
        }
        RedemptionState::Errored { reason, metadata, .. } => json!({
            "state": "errored",
            "reason": reason,
            "metadata": metadata,
            "destination": destination,
        }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn render_page_text(state: &RedemptionState, destination: Option<&str>) {
    match state {
        RedemptionState::Unauthenticated => println!("{WALLET_PROMPT}"),
        RedemptionState::Loading => println!("Loading link data..."),
        RedemptionState::Ready { metadata } => {
            println!("Title: {}", metadata.title);
            println!("Redirect URL: {}", metadata.redirect_url);
            println!("Run again with --redeem to credit the referral and continue.");
        }
        RedemptionState::Redeeming { .. } => println!("Confirm the transaction in the wallet"),
        RedemptionState::Redeemed { destination, .. } => {
            println!("Referral successful.");
            println!("Continue to: {destination}");
        }
        RedemptionState::Errored { reason, class, .. } => {
            println!("{reason}");
            if let (FailureClass::AlreadyReferred, Some(destination)) = (*class, destination) {
                println!("You may still continue to the page: {destination}");
            }
        }
    }
}

async fn run_links(config: &AppConfig, sub: &ArgMatches) {
    let session = session_for(config);
    if let Err(e) = ensure_account(&session).await {
        eprintln!("Error: {e}");
        return;
    }
    let store = store_for(config);
    match owner_links(&session, &store).await {
        Ok(campaigns) => {
            if output_format(sub) == "json" {
                match serde_json::to_string_pretty(&campaigns) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
                return;
            }
            if campaigns.is_empty() {
                println!("No campaigns yet.");
                return;
            }
            for campaign in campaigns {
                println!(
                    "{}  \"{}\" -> {}  (reward {})",
                    campaign.id, campaign.title, campaign.redirect_url, campaign.reward
                );
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

async fn run_history(config: &AppConfig, sub: &ArgMatches) {
    let address = sub
        .get_one::<String>("address")
        .expect("address is required");
    let client = HistoryClient::new(config.mirror_base_url.clone(), config.mirror_api_key.clone());
    match client.account_transactions(address).await {
        Ok(rows) => {
            let series = daily_counts(&rows);
            if output_format(sub) == "json" {
                match serde_json::to_string_pretty(&series) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
                return;
            }
            if series.is_empty() {
                println!("No transaction record found.");
                return;
            }
            for (day, count) in series {
                println!("{day}  {count}");
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

async fn run_fund(config: &AppConfig, sub: &ArgMatches) {
    let contract = sub
        .get_one::<String>("contract")
        .expect("contract is required");
    let amount = sub.get_one::<String>("amount").expect("amount is required");
    let Ok(amount) = amount.parse::<f64>() else {
        eprintln!("Error: \"{amount}\" is not a valid amount");
        return;
    };
    let session = session_for(config);
    if let Err(e) = ensure_account(&session).await {
        eprintln!("Error: {e}");
        return;
    }
    let gateway = LinkContractGateway::new(Arc::clone(&session));
    match gateway.fund(contract, amount).await {
        Ok(receipt) => println!("Funding transaction mined: {}", receipt.transaction_hash),
        Err(e) => eprintln!("Error: {e}"),
    }
}

//! Command Line Interface for the natural-language swap engine.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nlswap_api::{ApiServer, AppState, ServerConfig};
use nlswap_data::{CatalogConfig, PoolCatalog, demo_pools};
use nlswap_domain::PoolSnapshot;
use nlswap_domain::token::format_units;
use nlswap_execution::{
    ActionExecutor, ExecutionPlan, ExecutorConfig, PlanRunner, RunReport, gather_account_context,
};
use nlswap_protocols::memory::InMemoryLedger;
use nlswap_protocols::rpc::{RpcConfig, RpcLedger};
use nlswap_protocols::{ContractReader, ContractWriter, SwapLogSource};
use nlswap_resolver::{
    ActionResolver, BUILTIN_CASES, CompletionOverrides, CompletionSettings, run_eval,
};
use prettytable::{Table, row};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use zeroize::Zeroizing;

/// LP supply seeded for every demonstration pool.
const DEMO_LP_SUPPLY: u64 = 1_000;

/// Factory pairs read at startup.
const DISCOVERY_LIMIT: u64 = 20;

#[derive(Parser)]
#[command(name = "nlswap")]
#[command(about = "Natural-language swap and liquidity planner for Uniswap V2 pools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Serve the demonstration pools from an in-memory ledger
        #[arg(long)]
        demo: bool,
    },
    /// List known pools
    Pools {
        #[arg(long)]
        demo: bool,
    },
    /// Quote a swap
    Quote {
        /// Pair address or label (e.g., ETH/USDC)
        pool: String,

        /// Symbol of the token sold
        from: String,

        /// Amount sold, in whole units
        amount: Decimal,

        #[arg(long)]
        demo: bool,
    },
    /// Resolve an instruction into an action
    Resolve {
        /// The instruction, e.g. "Swap 0.1 ETH for USDC"
        instruction: String,

        /// Pair address or label the instruction targets
        #[arg(short, long, default_value = "ETH/USDC")]
        pool: String,

        /// Also plan the calls for this account
        #[arg(short, long)]
        user: Option<String>,

        /// Sign and submit the planned calls, one confirmation at a time
        #[arg(long, requires = "user")]
        execute: bool,

        #[arg(long)]
        demo: bool,
    },
    /// Run the built-in instruction set through the resolver
    Eval {
        #[arg(long)]
        demo: bool,
    },
}

/// Where submitted transactions go.
enum Submission {
    /// Recorded by the in-memory ledger.
    Demo(Arc<InMemoryLedger>),
    /// Sent to the node, signed with `PRIVATE_KEY` or by the node itself.
    Node { ledger: RpcLedger, config: RpcConfig },
}

/// Ledger access and the catalog built on it.
struct Backend {
    reader: Arc<dyn ContractReader>,
    swap_logs: Arc<dyn SwapLogSource>,
    catalog: Arc<PoolCatalog>,
    submission: Submission,
}

impl Backend {
    async fn connect(demo: bool) -> Result<Self> {
        if demo {
            let ledger = Arc::new(InMemoryLedger::new());
            let lp_supply = U256::from(DEMO_LP_SUPPLY) * U256::exp10(18);
            for pool in demo_pools() {
                ledger.seed_pool(&pool, lp_supply);
            }
            let catalog =
                PoolCatalog::with_demo_pools(ledger.clone(), CatalogConfig::default()).await;
            info!(pools = catalog.list().await.len(), "Using demonstration pools");
            return Ok(Self {
                reader: ledger.clone(),
                swap_logs: ledger.clone(),
                catalog: Arc::new(catalog),
                submission: Submission::Demo(ledger),
            });
        }

        let config = RpcConfig {
            url: env::var("RPC_URL").unwrap_or_else(|_| RpcConfig::default().url),
            ..RpcConfig::default()
        };
        info!(url = %config.url, "Connecting to node");
        let ledger = RpcLedger::connect(config.clone())?;
        let provider = Arc::new(ledger.clone());
        let catalog = PoolCatalog::new(provider.clone(), CatalogConfig::from_env());
        let loaded = catalog.refresh_all().await;
        let discovered = catalog
            .discover(DISCOVERY_LIMIT)
            .await
            .context("Factory discovery failed")?;
        info!(loaded, discovered, "Catalog ready");

        Ok(Self {
            reader: provider.clone(),
            swap_logs: provider,
            catalog: Arc::new(catalog),
            submission: Submission::Node { ledger, config },
        })
    }

    /// Writer that submits transactions from `user`.
    fn writer(&self, user: &str) -> Result<Arc<dyn ContractWriter>> {
        match &self.submission {
            Submission::Demo(ledger) => Ok(ledger.clone()),
            Submission::Node { ledger, config } => {
                let Some(key) = env::var("PRIVATE_KEY").ok().map(Zeroizing::new) else {
                    return Ok(Arc::new(ledger.clone().with_node_account(user)?));
                };
                let signing = RpcLedger::with_private_key(config.clone(), &key)?;
                if !signing
                    .sender()
                    .is_some_and(|sender| sender.eq_ignore_ascii_case(user))
                {
                    bail!("PRIVATE_KEY does not belong to {user}");
                }
                Ok(Arc::new(signing))
            }
        }
    }

    /// Submits every call of `plan` from `user`, waiting for each confirmation.
    async fn submit(&self, plan: &ExecutionPlan, user: &str) -> Result<RunReport> {
        let runner = PlanRunner::new(self.writer(user)?);
        match runner.run(plan).await {
            Ok(report) => Ok(report),
            Err(e) => {
                for step in &e.completed {
                    eprintln!("   confirmed {} ({})", step.function, step.tx);
                }
                Err(e.into())
            }
        }
    }

    /// Finds a pool by address or by `A/B` label.
    async fn pool(&self, key: &str) -> Result<Arc<PoolSnapshot>> {
        if let Some((a, b)) = key.split_once('/') {
            return match self.catalog.find_by_symbols(a.trim(), b.trim()).await {
                Some(pool) => Ok(pool),
                None => bail!("No known pool for {key}"),
            };
        }
        self.catalog
            .get_or_load(key)
            .await
            .with_context(|| format!("Failed to load pool {key}"))
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn resolver() -> Result<ActionResolver> {
    let client = CompletionSettings::from_env().client(&CompletionOverrides::default())?;
    Ok(ActionResolver::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { demo } => {
            let backend = Backend::connect(*demo).await?;
            let _refresh = backend.catalog.clone().spawn_refresh_loop();

            let state = AppState::new(
                backend.catalog,
                backend.reader,
                backend.swap_logs,
                ActionExecutor::new(ExecutorConfig::from_env()),
                CompletionSettings::from_env(),
            );
            let config = ServerConfig::from_env();
            println!("🚀 Serving on http://{}", config.bind_address());
            ApiServer::new(config, state).run().await?;
        }
        Commands::Pools { demo } => {
            let backend = Backend::connect(*demo).await?;
            let pools = backend.catalog.list().await;
            if pools.is_empty() {
                println!("❌ No pools known. Set KNOWN_PAIRS or FACTORY_ADDRESS.");
                return Ok(());
            }

            let mut table = Table::new();
            table.add_row(row!["Pair", "Address", "Reserve 0", "Reserve 1", "Fee (bps)"]);
            for pool in &pools {
                table.add_row(row![
                    pool.pair_label(),
                    pool.address,
                    format!(
                        "{} {}",
                        format_units(pool.reserve0, pool.decimals0),
                        pool.token0_symbol
                    ),
                    format!(
                        "{} {}",
                        format_units(pool.reserve1, pool.decimals1),
                        pool.token1_symbol
                    ),
                    pool.fee_rate_bps
                ]);
            }
            table.printstd();
        }
        Commands::Quote {
            pool,
            from,
            amount,
            demo,
        } => {
            let backend = Backend::connect(*demo).await?;
            let pool = backend.pool(pool).await?;
            let executor = ActionExecutor::new(ExecutorConfig::from_env());
            let quote = executor.quote(&pool, from, *amount)?;
            let side_out = quote.side_in.other();

            println!("\n📊 Quote for {}", pool.pair_label());
            println!("════════════════════════════════════");
            println!("Sell:          {} {}", amount, pool.symbol(quote.side_in));
            println!(
                "Expected:      {} {}",
                format_units(quote.expected_out, pool.decimals(side_out)),
                pool.symbol(side_out)
            );
            println!(
                "Minimum:       {} {} ({} bps slippage)",
                format_units(quote.min_out, pool.decimals(side_out)),
                pool.symbol(side_out),
                executor.config().slippage_bps
            );
            if let Some(price) = quote.spot_price {
                println!(
                    "Spot price:    {} {} per {}",
                    price,
                    pool.symbol(side_out),
                    pool.symbol(quote.side_in)
                );
            }
            println!("Price impact:  {} bps", quote.price_impact_bps);
            println!("════════════════════════════════════");
        }
        Commands::Resolve {
            instruction,
            pool,
            user,
            execute,
            demo,
        } => {
            let backend = Backend::connect(*demo).await?;
            let pool = backend.pool(pool).await?;
            let action = resolver()?.resolve(instruction, &pool).await?;

            println!("✅ {action}");
            println!("{}", serde_json::to_string_pretty(&action)?);

            if let Some(user) = user {
                let executor = ActionExecutor::new(ExecutorConfig::from_env());
                let account = gather_account_context(
                    backend.reader.as_ref(),
                    &pool,
                    user,
                    &executor.config().router_address,
                    unix_now()?,
                )
                .await?;
                let plan = executor.plan(&action, pool, &account)?;

                println!("\n📝 Plan {} ({} calls)", plan.id, plan.call_count());
                println!("════════════════════════════════════");
                for (step, call) in plan.calls().enumerate() {
                    println!("{:>2}. {} on {}", step + 1, call.function, call.address);
                    if let Some(value) = call.value {
                        println!("    value: {value}");
                    }
                    println!("    data:  {}", call.calldata_hex()?);
                }
                println!("Deadline: {}", plan.deadline);
                println!("{}", serde_json::to_string_pretty(&plan.summary)?);

                if *execute {
                    println!("\n🚀 Submitting {} calls from {user}...", plan.call_count());
                    let report = backend.submit(&plan, user).await?;
                    let mut table = Table::new();
                    table.add_row(row!["Step", "Function", "Transaction", "Confirmed"]);
                    for (step, receipt) in report.steps.iter().enumerate() {
                        table.add_row(row![
                            step + 1,
                            receipt.function,
                            receipt.tx,
                            receipt.confirmed_at.to_rfc3339()
                        ]);
                    }
                    table.printstd();
                    println!("✅ Plan {} executed", report.plan_id);
                }
            }
        }
        Commands::Eval { demo } => {
            let backend = Backend::connect(*demo).await?;
            let pools: Vec<PoolSnapshot> = backend
                .catalog
                .list()
                .await
                .iter()
                .map(|p| p.as_ref().clone())
                .collect();
            let resolver = resolver()?;

            println!("🚀 Running {} instructions...", BUILTIN_CASES.len());
            let outcomes = run_eval(&resolver, BUILTIN_CASES, &pools).await;

            let mut table = Table::new();
            table.add_row(row!["Instruction", "Pair", "Expected", "Resolved", "Result"]);
            for outcome in &outcomes {
                let expected = outcome
                    .case
                    .expected_action()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|e| format!("invalid: {e}"));
                let resolved = match &outcome.resolved {
                    None => "no such pool".to_string(),
                    Some(Ok(action)) => action.to_string(),
                    Some(Err(e)) => format!("error: {e}"),
                };
                let result = if outcome.passed() { "PASS" } else { "FAIL" };
                table.add_row(row![
                    outcome.case.input,
                    outcome.case.pair,
                    expected,
                    resolved,
                    result
                ]);
            }
            table.printstd();

            let passed = outcomes.iter().filter(|o| o.passed()).count();
            println!("\n{passed}/{} passed", outcomes.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlswap_domain::{Action, SwapParams};
    use rust_decimal_macros::dec;

    const USER: &str = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";

    #[test]
    fn test_execute_flag_parses_with_user() {
        let cli = Cli::try_parse_from([
            "nlswap", "resolve", "swap 1 ETH", "--user", USER, "--execute", "--demo",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve { user, execute, demo, .. } => {
                assert_eq!(user.as_deref(), Some(USER));
                assert!(execute);
                assert!(demo);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_execute_flag_requires_user() {
        let result = Cli::try_parse_from(["nlswap", "resolve", "swap 1 ETH", "--execute"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_demo_plan_is_submitted_in_order() {
        let backend = Backend::connect(true).await.unwrap();
        let pool = backend.pool("ETH/USDC").await.unwrap();
        let executor = ActionExecutor::new(ExecutorConfig::default());
        let account = gather_account_context(
            backend.reader.as_ref(),
            &pool,
            USER,
            &executor.config().router_address,
            unix_now().unwrap(),
        )
        .await
        .unwrap();
        let action = Action::Swap(SwapParams {
            from_symbol: "USDC".to_string(),
            to_symbol: "ETH".to_string(),
            amount: dec!(100),
        });
        let plan = executor.plan(&action, pool, &account).unwrap();

        let report = backend.submit(&plan, USER).await.unwrap();

        assert_eq!(report.plan_id, plan.id);
        assert_eq!(report.steps.len(), plan.call_count());
        let functions: Vec<_> = report.steps.iter().map(|s| s.function.clone()).collect();
        let planned: Vec<_> = plan.calls().map(|c| c.function.clone()).collect();
        assert_eq!(functions, planned);
        let Submission::Demo(ledger) = &backend.submission else {
            panic!("expected the demo ledger");
        };
        assert_eq!(ledger.submitted().len(), plan.call_count());
    }
}

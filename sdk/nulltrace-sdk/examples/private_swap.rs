// Example: Moving value through the private domain
//
// This example demonstrates how to:
// 1. Nullify public SOL into private records
// 2. Quote and execute a private swap through the operator
// 3. Reveal private value back to the public account
//
// The instruction builders for the compression programs are supplied by the
// caller through `CompressionProgram`.

use nulltrace_sdk::{NullTraceConfig, RpcLedger};

const SOL: &str = "So11111111111111111111111111111111111111112";
const USDC: &str = "EPjFWdd5AufqSSqeM2qJxEkpwZSdQ5K5EkpwbCLrK9v";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ledger = RpcLedger::new("https://mainnet.helius-rpc.com/?api-key=YOUR_KEY")?;
    // let signer = KeypairSigner::from_private_key("YOUR_BASE58_PRIVATE_KEY")?;
    let config = NullTraceConfig::from_env()?;
    println!("Operator: {}", config.operator_url);

    // 1. Build the client (pseudo-code, bring your own CompressionProgram)
    // let client = NullTrace::builder()
    //     .with_ledger(Arc::new(ledger))
    //     .with_program(Arc::new(YourCompressionProgram::new()))
    //     .with_signer(Arc::new(signer))
    //     .with_config(config)
    //     .build()?;

    // 2. Public -> private
    // let signatures = client.nullify(SOL, "0.5").await?;
    // println!("Nullified in {} transaction(s)", signatures.len());

    // 3. Quote, then swap with a progress callback
    // let quote = client.quote_swap(SOL, USDC, "0.25").await?;
    // println!("0.25 SOL -> {} USDC units", quote.out_amount);
    //
    // let options = SwapOptions::default()
    //     .with_timeout(Duration::from_secs(60))
    //     .on_status_change(|status| println!("  status: {:?}", status));
    // match client.swap(SOL, USDC, "0.25", options).await? {
    //     SwapOutcome::Completed { result } => println!("Swap done: {:?}", result.extra),
    //     SwapOutcome::Pending { session_id, .. } => println!("Still running: {}", session_id),
    // }

    // 4. Private -> public
    // client.reveal(USDC, "10").await?;

    println!("Would swap {} -> {}", SOL, USDC);
    println!("Example complete! (Uncomment code with a real compression program)");

    Ok(())
}

use actron_neo::{ActronApi, Coordinator};
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> actron_neo::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let username = env::var("ACTRON_USERNAME")
        .ok()
        .or_else(|| args.get(1).cloned())
        .expect("usage: monitor <username> <password> [serial]");
    let password = env::var("ACTRON_PASSWORD")
        .ok()
        .or_else(|| args.get(2).cloned())
        .expect("usage: monitor <username> <password> [serial]");

    let api = ActronApi::builder(username, password).build()?;
    let mut builder = Coordinator::builder(api).on_update(|status| {
        let main = &status.main;
        println!(
            "on: {} | mode: {:?} | fan: {:?} | indoor: {:?}\u{00b0}C | outdoor: {:?}\u{00b0}C",
            main.is_on, main.mode, main.fan_mode, main.indoor_temp, main.outdoor_temp,
        );
        for (id, zone) in &status.zones {
            println!(
                "  [{id}] {} {}| {:?}\u{00b0}C | cool {:?} / heat {:?}",
                zone.name,
                if zone.is_enabled { "" } else { "(off) " },
                zone.temp,
                zone.setpoint_cool,
                zone.setpoint_heat,
            );
        }
    });
    if let Some(serial) = args.get(3) {
        builder = builder.serial(serial);
    }

    println!("Connecting...");
    let coordinator = Arc::new(builder.connect().await?);
    println!(
        "Bound to {} ({}). Polling every 60s, Ctrl-C to stop.",
        coordinator.device().name,
        coordinator.device_id(),
    );

    coordinator
        .run(Duration::from_secs(60), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    coordinator.close().await;
    Ok(())
}

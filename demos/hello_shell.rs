use tabshell::session::null::NullSessionFactory;
use tabshell::{BrowserShell, NullView, ShellAction, ShellConfig, ShellError, SwitcherIntent, TabEvent};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), ShellError> {
    env_logger::init();

    // Configure the shell through the config builder. Values that are not set keep their
    // defaults.
    let cfg = ShellConfig::builder()
        .homepage("https://example.org")
        .thumbnail_delay_ms(200)
        .build()?;

    // Null sessions do not render anything, but they report navigation events like a
    // real engine would. The null view records what it is attached to.
    let factory = NullSessionFactory::new().emit_navigation(true);
    let view = NullView::new(factory.log());
    let call_log = factory.log();

    // Start the shell. A homepage tab is opened as soon as the loop runs.
    let shell = BrowserShell::new(cfg, Box::new(factory), Box::new(view));
    let (handle, join_handle) = shell.start();

    // Only events sent from this point on are received.
    let mut event_rx = handle.subscribe_events();
    tokio::spawn(async move {
        while let Ok(ev) = event_rx.recv().await {
            match ev {
                TabEvent::Added { tab_id } => println!("[event] tab added: {tab_id}"),
                TabEvent::Removed { tab_id } => println!("[event] tab removed: {tab_id}"),
                TabEvent::Selected { tab_id } => println!("[event] tab selected: {tab_id}"),
                TabEvent::Updated => {}
            }
        }
    });

    handle.action(ShellAction::Submit("rust browser shell".into())).await?;
    handle.action(ShellAction::NewTab).await?;
    handle.action(ShellAction::Submit("example.com".into())).await?;

    // Give the deferred thumbnail captures time to fire
    sleep(Duration::from_millis(300)).await;

    if let Some(model) = handle.action(ShellAction::OpenTabSwitcher).await? {
        println!("Switcher shows {}", model.count_label);
        for card in &model.cards {
            let marker = if card.is_selected { "*" } else { " " };
            let thumb = if card.thumbnail.is_some() { "thumbnail" } else { "no thumbnail" };
            println!(" {marker} {} ({thumb})", card.title);
        }

        if let Some(first) = model.cards.first() {
            handle.switcher(SwitcherIntent::Select(first.id)).await?;
        }
    }

    let snapshot = handle.snapshot().await?;
    println!("Selected tab: {:?}", snapshot.selected);
    println!("URL bar: {:?}", snapshot.chrome.url());
    println!("Back: {}  Forward: {}", snapshot.chrome.can_go_back(), snapshot.chrome.can_go_forward());

    handle.shutdown().await?;
    let _ = join_handle.await;

    println!("Session calls:");
    for entry in call_log.lock().iter() {
        println!("  {entry}");
    }

    Ok(())
}

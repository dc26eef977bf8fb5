use anyhow::Result;
use dog_tracker_backend::config::{default_data_directory, TrackerConfig};
use dog_tracker_backend::domain::CalendarService;
use dog_tracker_backend::initialize_backend_with;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let data_dir = default_data_directory()?;
    let config = TrackerConfig::load_or_create(&data_dir)?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Using data directory {:?}", data_dir);
    let app_state = initialize_backend_with(&data_dir, config, CalendarService::default()).await?;

    let status = app_state.startup.run().await?;
    info!("Startup status: {}", status);

    match app_state.selected_dog.current() {
        Some(dog) => {
            let eaten = app_state
                .food_service
                .calories_for(dog.id, &app_state.calendar.today())
                .await?;
            info!(
                "Selected dog: {} (today: {} of {} calories, {} logged)",
                dog.name, dog.daily_current_calories, dog.daily_max_calories, eaten
            );
        }
        None => info!("No dog selected yet"),
    }

    let dogs = app_state.dog_service.list_dogs().await?;
    info!("{} dogs stored", dogs.len());

    Ok(())
}

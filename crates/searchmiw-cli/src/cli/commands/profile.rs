use anyhow::Result;
use searchmiw_core::api::Dispatcher;
use searchmiw_core::services::ProfileService;

pub async fn show(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let profile = ProfileService::new(dispatcher).get_profile().await?;
    if json {
        return super::print_json(&profile);
    }

    println!("Name:    {}", profile.name);
    println!("Email:   {}", profile.email);
    println!("User ID: {}", profile.id);
    if let Some(created) = profile.created_at.as_deref() {
        println!("Joined:  {created}");
    }
    if let Some(updated) = profile.updated_at.as_deref() {
        println!("Updated: {updated}");
    }
    Ok(())
}

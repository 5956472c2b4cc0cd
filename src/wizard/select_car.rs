use crate::models::{SearchState, VehicleOption};
use crate::services::booking::{
    calc_distance_km, list_cities, list_vehicle_types, price_vehicles, resolve_city_id,
};
use crate::services::ApiClient;

/// Priced vehicle list for a search. A city that does not resolve, or a
/// failed distance lookup, only zeroes the distance term.
pub async fn load_vehicle_options(api: &ApiClient, search: &SearchState) -> Vec<VehicleOption> {
    let cities = list_cities(api).await;
    let from_city_id = resolve_city_id(&cities, &search.from_city_name);
    let to_city_id = resolve_city_id(&cities, &search.to_city_name);

    let distance_km = match (from_city_id, to_city_id) {
        (Some(from), Some(to)) => calc_distance_km(api, from, to).await,
        _ => {
            tracing::debug!(
                from = %search.from_city_name,
                to = %search.to_city_name,
                "cities unresolved, pricing without distance"
            );
            0.0
        }
    };

    let types = list_vehicle_types(api).await;
    let options = price_vehicles(&types, distance_km);
    if options.is_empty() {
        tracing::info!("no vehicle types available");
    }
    options
}

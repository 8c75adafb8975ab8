use crate::media::MediaStorage;
use crate::store::{AirplaneFilter, AirportStore, CityFilter, StoreResult};
use crate::validation::{Validator, DEPARTURE_AFTER_ARRIVAL, SAME_ENDPOINTS};
use airport_models::{
    Airplane, AirplaneDetail, AirplaneImage, AirplaneListItem, AirplanePatch, AirplaneRequest,
    AirplaneType, AirplaneTypePatch, AirplaneTypeRequest, AirplaneView, Airport, AirportError,
    AirportPatch, AirportRequest, Crew, CrewPatch, CrewRequest, CrewView, Flight, FlightDetail,
    FlightListItem, FlightPatch, FlightRequest, FlightView, NewAirplane, NewFlight, NewRoute,
    PageRequest, Paginated, Route, RouteDetail, RouteListItem, RoutePatch, RouteRequest,
    RouteView,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};

const NAME_MAX: usize = 255;
const CREW_NAME_MAX: usize = 63;

fn first_or_not_found<T>(items: Vec<T>, resource: &'static str, id: i64) -> StoreResult<T> {
    items
        .into_iter()
        .next()
        .ok_or(AirportError::NotFound { resource, id })
}

fn unique_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Fleet, network and schedule management: airplane types, airplanes,
/// airports, routes, crews and flights.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn AirportStore>,
    media: MediaStorage,
}

impl CatalogService {
    pub fn new(store: Arc<dyn AirportStore>, media: MediaStorage) -> Self {
        Self { store, media }
    }

    // ---- Airplane types ----

    pub async fn list_airplane_types(&self, page: PageRequest) -> StoreResult<Paginated<AirplaneType>> {
        self.store.list_airplane_types(page).await
    }

    pub async fn get_airplane_type(&self, id: i64) -> StoreResult<AirplaneType> {
        let found = self.store.airplane_types_by_ids(&[id]).await?;
        first_or_not_found(found, "airplane type", id)
    }

    #[instrument(skip(self))]
    pub async fn create_airplane_type(&self, request: AirplaneTypeRequest) -> StoreResult<AirplaneType> {
        let mut validator = Validator::new();
        validator.text("name", &request.name, NAME_MAX);
        validator.finish()?;

        let created = self.store.insert_airplane_type(request.name.trim()).await?;
        info!("Created airplane type {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update_airplane_type(
        &self,
        id: i64,
        request: AirplaneTypeRequest,
    ) -> StoreResult<AirplaneType> {
        self.patch_airplane_type(id, AirplaneTypePatch { name: Some(request.name) })
            .await
    }

    #[instrument(skip(self))]
    pub async fn patch_airplane_type(&self, id: i64, patch: AirplaneTypePatch) -> StoreResult<AirplaneType> {
        let mut airplane_type = self.get_airplane_type(id).await?;
        if let Some(name) = patch.name {
            airplane_type.name = name;
        }

        let mut validator = Validator::new();
        validator.text("name", &airplane_type.name, NAME_MAX);
        validator.finish()?;

        airplane_type.name = airplane_type.name.trim().to_string();
        self.store.update_airplane_type(&airplane_type).await?;
        Ok(airplane_type)
    }

    // ---- Airplanes ----

    fn image_url(&self, airplane: &Airplane) -> Option<String> {
        airplane.image.as_deref().map(|path| self.media.url_for(path))
    }

    async fn type_names(&self, ids: impl IntoIterator<Item = i64>) -> StoreResult<HashMap<i64, String>> {
        let types = self.store.airplane_types_by_ids(&unique_ids(ids)).await?;
        Ok(types.into_iter().map(|t| (t.id, t.name)).collect())
    }

    async fn airplane_list_items(&self, airplanes: Vec<Airplane>) -> StoreResult<Vec<AirplaneListItem>> {
        let names = self.type_names(airplanes.iter().map(|a| a.airplane_type_id)).await?;
        Ok(airplanes
            .into_iter()
            .map(|airplane| AirplaneListItem {
                image: self.image_url(&airplane),
                capacity: airplane.capacity(),
                airplane_type: names
                    .get(&airplane.airplane_type_id)
                    .cloned()
                    .unwrap_or_default(),
                id: airplane.id,
                name: airplane.name,
            })
            .collect())
    }

    fn airplane_view(&self, airplane: Airplane) -> AirplaneView {
        AirplaneView {
            image: self.image_url(&airplane),
            capacity: airplane.capacity(),
            id: airplane.id,
            name: airplane.name,
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type: airplane.airplane_type_id,
        }
    }

    async fn find_airplane(&self, id: i64) -> StoreResult<Airplane> {
        let found = self.store.airplanes_by_ids(&[id]).await?;
        first_or_not_found(found, "airplane", id)
    }

    async fn validate_airplane(&self, airplane: &NewAirplane) -> StoreResult<()> {
        let mut validator = Validator::new();
        validator
            .text("name", &airplane.name, NAME_MAX)
            .min_value("rows", airplane.rows.into(), 1)
            .min_value("seats_in_row", airplane.seats_in_row.into(), 1);
        let type_exists = !self
            .store
            .airplane_types_by_ids(&[airplane.airplane_type_id])
            .await?
            .is_empty();
        validator.reference("airplane_type", airplane.airplane_type_id, type_exists);
        validator.finish()
    }

    pub async fn list_airplanes(
        &self,
        filter: &AirplaneFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<AirplaneListItem>> {
        let listing = self.store.list_airplanes(filter, page).await?;
        let items = self.airplane_list_items(listing.items).await?;
        Ok(Paginated {
            items,
            count: listing.count,
            page: listing.page,
        })
    }

    pub async fn get_airplane(&self, id: i64) -> StoreResult<AirplaneDetail> {
        let airplane = self.find_airplane(id).await?;
        let names = self.type_names([airplane.airplane_type_id]).await?;
        Ok(AirplaneDetail {
            image: self.image_url(&airplane),
            capacity: airplane.capacity(),
            airplane_type: names
                .get(&airplane.airplane_type_id)
                .cloned()
                .unwrap_or_default(),
            id: airplane.id,
            name: airplane.name,
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_airplane(&self, request: AirplaneRequest) -> StoreResult<AirplaneView> {
        let airplane = NewAirplane {
            name: request.name.trim().to_string(),
            rows: request.rows,
            seats_in_row: request.seats_in_row,
            airplane_type_id: request.airplane_type,
        };
        self.validate_airplane(&airplane).await?;

        let created = self.store.insert_airplane(airplane).await?;
        info!("Created airplane {} with capacity {}", created.id, created.capacity());
        Ok(self.airplane_view(created))
    }

    pub async fn update_airplane(&self, id: i64, request: AirplaneRequest) -> StoreResult<AirplaneView> {
        let patch = AirplanePatch {
            name: Some(request.name),
            rows: Some(request.rows),
            seats_in_row: Some(request.seats_in_row),
            airplane_type: Some(request.airplane_type),
        };
        self.patch_airplane(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn patch_airplane(&self, id: i64, patch: AirplanePatch) -> StoreResult<AirplaneView> {
        let mut airplane = self.find_airplane(id).await?;
        let candidate = NewAirplane {
            name: patch.name.unwrap_or(airplane.name).trim().to_string(),
            rows: patch.rows.unwrap_or(airplane.rows),
            seats_in_row: patch.seats_in_row.unwrap_or(airplane.seats_in_row),
            airplane_type_id: patch.airplane_type.unwrap_or(airplane.airplane_type_id),
        };
        self.validate_airplane(&candidate).await?;

        airplane.name = candidate.name;
        airplane.rows = candidate.rows;
        airplane.seats_in_row = candidate.seats_in_row;
        airplane.airplane_type_id = candidate.airplane_type_id;
        self.store.update_airplane(&airplane).await?;
        Ok(self.airplane_view(airplane))
    }

    /// Store a new image for the airplane, replacing any previous one.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_airplane_image(&self, id: i64, bytes: &[u8]) -> StoreResult<AirplaneImage> {
        let mut airplane = self.find_airplane(id).await?;
        let stored = self.media.save_airplane_image(&airplane.name, bytes).await?;

        let previous = airplane.image.replace(stored);
        self.store.update_airplane(&airplane).await?;
        if let Some(previous) = previous {
            self.media.remove(&previous).await;
        }

        Ok(AirplaneImage {
            id: airplane.id,
            image: self.image_url(&airplane),
        })
    }

    // ---- Airports ----

    pub async fn list_airports(&self, page: PageRequest) -> StoreResult<Paginated<Airport>> {
        self.store.list_airports(page).await
    }

    pub async fn get_airport(&self, id: i64) -> StoreResult<Airport> {
        let found = self.store.airports_by_ids(&[id]).await?;
        first_or_not_found(found, "airport", id)
    }

    fn validate_airport(name: &str, city: &str) -> StoreResult<()> {
        let mut validator = Validator::new();
        validator
            .text("name", name, NAME_MAX)
            .text("closest_big_city", city, NAME_MAX);
        validator.finish()
    }

    #[instrument(skip(self))]
    pub async fn create_airport(&self, request: AirportRequest) -> StoreResult<Airport> {
        Self::validate_airport(&request.name, &request.closest_big_city)?;
        let created = self
            .store
            .insert_airport(request.name.trim(), request.closest_big_city.trim())
            .await?;
        info!("Created airport {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update_airport(&self, id: i64, request: AirportRequest) -> StoreResult<Airport> {
        let patch = AirportPatch {
            name: Some(request.name),
            closest_big_city: Some(request.closest_big_city),
        };
        self.patch_airport(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn patch_airport(&self, id: i64, patch: AirportPatch) -> StoreResult<Airport> {
        let mut airport = self.get_airport(id).await?;
        if let Some(name) = patch.name {
            airport.name = name;
        }
        if let Some(city) = patch.closest_big_city {
            airport.closest_big_city = city;
        }
        Self::validate_airport(&airport.name, &airport.closest_big_city)?;

        airport.name = airport.name.trim().to_string();
        airport.closest_big_city = airport.closest_big_city.trim().to_string();
        self.store.update_airport(&airport).await?;
        Ok(airport)
    }

    // ---- Routes ----

    async fn airports_map(&self, ids: impl IntoIterator<Item = i64>) -> StoreResult<HashMap<i64, Airport>> {
        let airports = self.store.airports_by_ids(&unique_ids(ids)).await?;
        Ok(airports.into_iter().map(|a| (a.id, a)).collect())
    }

    async fn route_list_items(&self, routes: &[Route]) -> StoreResult<HashMap<i64, RouteListItem>> {
        let airports = self
            .airports_map(routes.iter().flat_map(|r| [r.source_id, r.destination_id]))
            .await?;
        let city = |id: i64| {
            airports
                .get(&id)
                .map(|a| a.closest_big_city.clone())
                .unwrap_or_default()
        };
        Ok(routes
            .iter()
            .map(|route| {
                (
                    route.id,
                    RouteListItem {
                        id: route.id,
                        source: city(route.source_id),
                        destination: city(route.destination_id),
                        distance: route.distance,
                    },
                )
            })
            .collect())
    }

    fn route_view(route: &Route) -> RouteView {
        RouteView {
            id: route.id,
            source: route.source_id,
            destination: route.destination_id,
            distance: route.distance,
        }
    }

    async fn find_route(&self, id: i64) -> StoreResult<Route> {
        let found = self.store.routes_by_ids(&[id]).await?;
        first_or_not_found(found, "route", id)
    }

    async fn validate_route(&self, route: &NewRoute) -> StoreResult<()> {
        let airports = self.airports_map([route.source_id, route.destination_id]).await?;
        let mut validator = Validator::new();
        validator
            .reference("source", route.source_id, airports.contains_key(&route.source_id))
            .reference(
                "destination",
                route.destination_id,
                airports.contains_key(&route.destination_id),
            )
            .min_value("distance", route.distance.into(), 1);
        if validator.is_valid() && route.source_id == route.destination_id {
            validator.non_field(SAME_ENDPOINTS);
        }
        validator.finish()
    }

    pub async fn list_routes(
        &self,
        filter: &CityFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<RouteListItem>> {
        let listing = self.store.list_routes(filter, page).await?;
        let mut rendered = self.route_list_items(&listing.items).await?;
        let items = listing
            .items
            .iter()
            .filter_map(|route| rendered.remove(&route.id))
            .collect();
        Ok(Paginated {
            items,
            count: listing.count,
            page: listing.page,
        })
    }

    pub async fn get_route(&self, id: i64) -> StoreResult<RouteDetail> {
        let route = self.find_route(id).await?;
        let mut airports = self.airports_map([route.source_id, route.destination_id]).await?;
        let source = airports
            .get(&route.source_id)
            .cloned()
            .ok_or(AirportError::NotFound {
                resource: "airport",
                id: route.source_id,
            })?;
        let destination = airports
            .remove(&route.destination_id)
            .ok_or(AirportError::NotFound {
                resource: "airport",
                id: route.destination_id,
            })?;
        Ok(RouteDetail {
            id: route.id,
            source,
            destination,
            distance: route.distance,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_route(&self, request: RouteRequest) -> StoreResult<RouteView> {
        let route = NewRoute {
            source_id: request.source,
            destination_id: request.destination,
            distance: request.distance,
        };
        self.validate_route(&route).await?;
        let created = self.store.insert_route(route).await?;
        info!("Created route {}", created.id);
        Ok(Self::route_view(&created))
    }

    pub async fn update_route(&self, id: i64, request: RouteRequest) -> StoreResult<RouteView> {
        let patch = RoutePatch {
            source: Some(request.source),
            destination: Some(request.destination),
            distance: Some(request.distance),
        };
        self.patch_route(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn patch_route(&self, id: i64, patch: RoutePatch) -> StoreResult<RouteView> {
        let mut route = self.find_route(id).await?;
        let candidate = NewRoute {
            source_id: patch.source.unwrap_or(route.source_id),
            destination_id: patch.destination.unwrap_or(route.destination_id),
            distance: patch.distance.unwrap_or(route.distance),
        };
        self.validate_route(&candidate).await?;

        route.source_id = candidate.source_id;
        route.destination_id = candidate.destination_id;
        route.distance = candidate.distance;
        self.store.update_route(&route).await?;
        Ok(Self::route_view(&route))
    }

    // ---- Crews ----

    pub async fn list_crews(&self, page: PageRequest) -> StoreResult<Paginated<CrewView>> {
        Ok(self.store.list_crews(page).await?.map(CrewView::from))
    }

    async fn find_crew(&self, id: i64) -> StoreResult<Crew> {
        let found = self.store.crews_by_ids(&[id]).await?;
        first_or_not_found(found, "crew", id)
    }

    pub async fn get_crew(&self, id: i64) -> StoreResult<CrewView> {
        Ok(self.find_crew(id).await?.into())
    }

    fn validate_crew(first_name: &str, last_name: &str) -> StoreResult<()> {
        let mut validator = Validator::new();
        validator
            .text("first_name", first_name, CREW_NAME_MAX)
            .text("last_name", last_name, CREW_NAME_MAX);
        validator.finish()
    }

    #[instrument(skip(self))]
    pub async fn create_crew(&self, request: CrewRequest) -> StoreResult<CrewView> {
        Self::validate_crew(&request.first_name, &request.last_name)?;
        let created = self
            .store
            .insert_crew(request.first_name.trim(), request.last_name.trim())
            .await?;
        info!("Created crew member {}", created.id);
        Ok(created.into())
    }

    pub async fn update_crew(&self, id: i64, request: CrewRequest) -> StoreResult<CrewView> {
        let patch = CrewPatch {
            first_name: Some(request.first_name),
            last_name: Some(request.last_name),
        };
        self.patch_crew(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn patch_crew(&self, id: i64, patch: CrewPatch) -> StoreResult<CrewView> {
        let mut crew = self.find_crew(id).await?;
        if let Some(first_name) = patch.first_name {
            crew.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            crew.last_name = last_name;
        }
        Self::validate_crew(&crew.first_name, &crew.last_name)?;

        crew.first_name = crew.first_name.trim().to_string();
        crew.last_name = crew.last_name.trim().to_string();
        self.store.update_crew(&crew).await?;
        Ok(crew.into())
    }

    // ---- Flights ----

    async fn find_flight(&self, id: i64) -> StoreResult<Flight> {
        let found = self.store.flights_by_ids(&[id]).await?;
        first_or_not_found(found, "flight", id)
    }

    async fn validate_flight(&self, flight: &NewFlight) -> StoreResult<()> {
        let mut validator = Validator::new();

        let route_exists = !self.store.routes_by_ids(&[flight.route_id]).await?.is_empty();
        validator.reference("route", flight.route_id, route_exists);

        let airplane_exists = !self
            .store
            .airplanes_by_ids(&[flight.airplane_id])
            .await?
            .is_empty();
        validator.reference("airplane", flight.airplane_id, airplane_exists);

        let crews = self.store.crews_by_ids(&unique_ids(flight.crew_ids.iter().copied())).await?;
        for crew_id in &flight.crew_ids {
            if !crews.iter().any(|c| c.id == *crew_id) {
                validator.reference("crews", *crew_id, false);
                break;
            }
        }

        if validator.is_valid() && flight.departure_time >= flight.arrival_time {
            validator.non_field(DEPARTURE_AFTER_ARRIVAL);
        }
        validator.finish()
    }

    pub async fn list_flights(
        &self,
        filter: &CityFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<FlightListItem>> {
        let listing = self.store.list_flights(filter, page).await?;
        let routes = self
            .store
            .routes_by_ids(&unique_ids(listing.items.iter().map(|f| f.route_id)))
            .await?;
        let rendered = self.route_list_items(&routes).await?;

        let mut items = Vec::with_capacity(listing.items.len());
        for flight in &listing.items {
            let route = rendered
                .get(&flight.route_id)
                .cloned()
                .ok_or(AirportError::NotFound {
                    resource: "route",
                    id: flight.route_id,
                })?;
            items.push(FlightListItem {
                id: flight.id,
                route,
                departure_time: flight.departure_time,
            });
        }
        Ok(Paginated {
            items,
            count: listing.count,
            page: listing.page,
        })
    }

    pub async fn get_flight(&self, id: i64) -> StoreResult<FlightDetail> {
        let flight = self.find_flight(id).await?;

        let route = self.find_route(flight.route_id).await?;
        let route = self
            .route_list_items(std::slice::from_ref(&route))
            .await?
            .remove(&route.id)
            .ok_or(AirportError::NotFound {
                resource: "route",
                id: flight.route_id,
            })?;

        let airplane = self.find_airplane(flight.airplane_id).await?;
        let airplane = self
            .airplane_list_items(vec![airplane])
            .await?
            .pop()
            .ok_or(AirportError::NotFound {
                resource: "airplane",
                id: flight.airplane_id,
            })?;

        let crews = self
            .store
            .crews_by_ids(&flight.crew_ids)
            .await?
            .iter()
            .map(Crew::full_name)
            .collect();

        Ok(FlightDetail {
            id: flight.id,
            route,
            airplane,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crews,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_flight(&self, request: FlightRequest) -> StoreResult<FlightView> {
        let flight = NewFlight {
            route_id: request.route,
            airplane_id: request.airplane,
            departure_time: request.departure_time,
            arrival_time: request.arrival_time,
            crew_ids: unique_ids(request.crews),
        };
        self.validate_flight(&flight).await?;
        let created = self.store.insert_flight(flight).await?;
        Ok(created.into())
    }

    pub async fn update_flight(&self, id: i64, request: FlightRequest) -> StoreResult<FlightView> {
        let patch = FlightPatch {
            route: Some(request.route),
            airplane: Some(request.airplane),
            departure_time: Some(request.departure_time),
            arrival_time: Some(request.arrival_time),
            crews: Some(request.crews),
        };
        self.patch_flight(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn patch_flight(&self, id: i64, patch: FlightPatch) -> StoreResult<FlightView> {
        let mut flight = self.find_flight(id).await?;
        let candidate = NewFlight {
            route_id: patch.route.unwrap_or(flight.route_id),
            airplane_id: patch.airplane.unwrap_or(flight.airplane_id),
            departure_time: patch.departure_time.unwrap_or(flight.departure_time),
            arrival_time: patch.arrival_time.unwrap_or(flight.arrival_time),
            crew_ids: unique_ids(patch.crews.unwrap_or_else(|| flight.crew_ids.clone())),
        };
        self.validate_flight(&candidate).await?;

        flight.route_id = candidate.route_id;
        flight.airplane_id = candidate.airplane_id;
        flight.departure_time = candidate.departure_time;
        flight.arrival_time = candidate.arrival_time;
        flight.crew_ids = candidate.crew_ids;
        self.store.update_flight(&flight).await?;
        Ok(flight.into())
    }
}

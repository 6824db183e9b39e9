use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const VALID_API_KEY: &str = "4-e3wM-sWsw-Su3pI";
pub const USERNAME: &str = "testuser@test.com";
pub const PASSWORD: &str = "P@ssw0rd!";

#[derive(Clone, Debug)]
pub struct SetRecord {
    pub set_id: u64,
    pub number: String,
    pub name: String,
    pub year: u32,
    pub theme: String,
    pub subtheme: String,
    pub pieces: u32,
    pub instructions: Vec<Value>,
    pub additional_images: Vec<Value>,
    pub reviews: Vec<Value>,
}

#[derive(Clone, Debug)]
pub struct MinifigRecord {
    pub number: String,
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionEntry {
    pub own: bool,
    pub want: bool,
    pub qty_owned: u64,
    pub notes: String,
    pub rating: u64,
}

#[derive(Debug, Default)]
pub struct Store {
    pub api_keys: HashSet<String>,
    pub passwords: HashMap<String, String>,
    /// Session hash -> username.
    pub sessions: HashMap<String, String>,
    pub sets: Vec<SetRecord>,
    pub minifigs: Vec<MinifigRecord>,
    /// Username -> set id -> entry.
    pub set_collections: HashMap<String, BTreeMap<u64, CollectionEntry>>,
    /// Username -> minifig number -> entry.
    pub minifig_collections: HashMap<String, BTreeMap<String, CollectionEntry>>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/api/v3.asmx/{endpoint}", post(dispatch))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn seed() -> Store {
    let indy = |set_id: u64, number: &str, name: &str, year: u32, subtheme: &str, pieces: u32| SetRecord {
        set_id,
        number: number.to_string(),
        name: name.to_string(),
        year,
        theme: "Indiana Jones".to_string(),
        subtheme: subtheme.to_string(),
        pieces,
        instructions: Vec::new(),
        additional_images: Vec::new(),
        reviews: Vec::new(),
    };

    let mut temple = indy(6905, "7623", "Temple Escape", 2008, "Raiders of the Lost Ark", 550);
    temple.instructions = vec![
        json!({"URL": "https://lego.example/7623-1.pdf", "description": "BI 3006/60 - 7623 1/2"}),
        json!({"URL": "https://lego.example/7623-2.pdf", "description": "BI 3006/60 - 7623 2/2"}),
    ];
    temple.additional_images = vec![json!({
        "thumbnailURL": "https://images.example/7623-1_tn.jpg",
        "imageURL": "https://images.example/7623-1.jpg",
    })];
    temple.reviews = vec![json!({
        "author": "brickfan",
        "datePosted": "2008-06-01T00:00:00Z",
        "rating": {"overall": 5, "parts": 4, "buildingExperience": 5, "playability": 5, "valueForMoney": 4},
        "title": "Great temple",
        "review": "Lots of traps.",
        "HTML": false,
    })];

    let sets = vec![
        temple,
        indy(6906, "7624", "Jungle Duel", 2008, "Raiders of the Lost Ark", 83),
        indy(7070, "7627", "Temple of the Crystal Skull", 2008, "Kingdom of the Crystal Skull", 929),
        indy(8469, "7199", "The Temple of Doom", 2009, "Temple of Doom", 652),
        SetRecord {
            set_id: 1260,
            number: "6980".to_string(),
            name: "Galaxy Commander".to_string(),
            year: 1983,
            theme: "Space".to_string(),
            subtheme: "Classic Space".to_string(),
            pieces: 426,
            instructions: Vec::new(),
            additional_images: Vec::new(),
            reviews: Vec::new(),
        },
    ];

    let minifigs = vec![
        MinifigRecord {
            number: "iaj001".to_string(),
            name: "Indiana Jones - Open Jacket".to_string(),
            category: "Indiana Jones".to_string(),
        },
        MinifigRecord {
            number: "colhp28".to_string(),
            name: "Luna Lovegood".to_string(),
            category: "Collectable Minifigures".to_string(),
        },
    ];

    let mut store = Store {
        sets,
        minifigs,
        ..Store::default()
    };
    store.api_keys.insert(VALID_API_KEY.to_string());
    store.passwords.insert(USERNAME.to_string(), PASSWORD.to_string());

    let mut owned_sets = BTreeMap::new();
    owned_sets.insert(
        6905,
        CollectionEntry {
            own: true,
            qty_owned: 1,
            notes: "Boxed, complete".to_string(),
            rating: 5,
            ..CollectionEntry::default()
        },
    );
    store.set_collections.insert(USERNAME.to_string(), owned_sets);

    let mut owned_minifigs = BTreeMap::new();
    owned_minifigs.insert(
        "iaj001".to_string(),
        CollectionEntry {
            own: true,
            qty_owned: 2,
            notes: "One with hat".to_string(),
            ..CollectionEntry::default()
        },
    );
    store.minifig_collections.insert(USERNAME.to_string(), owned_minifigs);

    store
}

type Fields = HashMap<String, String>;

async fn dispatch(
    State(db): State<Db>,
    Path(endpoint): Path<String>,
    Form(fields): Form<Fields>,
) -> Result<Json<Value>, StatusCode> {
    debug!(%endpoint, "request");
    let api_key = fields.get("apiKey").map(String::as_str).unwrap_or("");

    let mut store = db.write().await;
    if !store.api_keys.contains(api_key) {
        return Ok(error("Invalid API key"));
    }

    let body = match endpoint.as_str() {
        "checkKey" => json!({"status": "success"}),
        "login" => login(&mut store, &fields),
        "getThemes" => get_themes(&store),
        "getSubthemes" => get_subthemes(&store, field(&fields, "Theme")),
        "getYears" => get_years(&store, field(&fields, "Theme")),
        "getSets" => get_sets(&store, &fields),
        "getInstructions" => set_lookup(&store, &fields, "instructions", |s| &s.instructions),
        "getAdditionalImages" => {
            set_lookup(&store, &fields, "additionalImages", |s| &s.additional_images)
        }
        "getReviews" => set_lookup(&store, &fields, "reviews", |s| &s.reviews),
        "getMinifigCollection" => get_minifig_collection(&store, &fields),
        "setCollection" => set_collection(&mut store, &fields),
        "setMinifigCollection" => set_minifig_collection(&mut store, &fields),
        "getUserNotes" => get_user_notes(&store, &fields),
        "getUserMinifigNotes" => get_user_minifig_notes(&store, &fields),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(body))
}

fn error(message: &str) -> Json<Value> {
    Json(error_body(message))
}

fn error_body(message: &str) -> Value {
    json!({"status": "error", "message": message})
}

fn field<'a>(fields: &'a Fields, key: &str) -> &'a str {
    fields.get(key).map(String::as_str).unwrap_or("")
}

/// Resolve `userHash` to a username.
fn user<'a>(store: &'a Store, fields: &Fields) -> Result<&'a str, Value> {
    store
        .sessions
        .get(field(fields, "userHash"))
        .map(String::as_str)
        .ok_or_else(|| error_body("Invalid user hash"))
}

/// Decode the JSON `params` field; absent means `{}`.
fn params(fields: &Fields) -> Result<Map<String, Value>, Value> {
    match fields.get("params") {
        None => Ok(Map::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|_| error_body("Invalid parameter: params")),
    }
}

/// `""` and missing are unset; numbers and numeric strings are flags.
fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s != "0" && !s.eq_ignore_ascii_case("false")),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn login(store: &mut Store, fields: &Fields) -> Value {
    let username = field(fields, "username");
    if store.passwords.get(username).map(String::as_str) != Some(field(fields, "password")) {
        return error_body("Invalid username or password");
    }
    let hash = Uuid::new_v4().simple().to_string();
    store.sessions.insert(hash.clone(), username.to_string());
    json!({"status": "success", "hash": hash})
}

fn get_themes(store: &Store) -> Value {
    let mut themes: BTreeMap<&str, Vec<&SetRecord>> = BTreeMap::new();
    for set in &store.sets {
        themes.entry(set.theme.as_str()).or_default().push(set);
    }
    let themes: Vec<Value> = themes
        .into_iter()
        .map(|(theme, sets)| {
            let subthemes: HashSet<&str> = sets.iter().map(|s| s.subtheme.as_str()).collect();
            json!({
                "theme": theme,
                "setCount": sets.len(),
                "subthemeCount": subthemes.len(),
                "yearFrom": sets.iter().map(|s| s.year).min(),
                "yearTo": sets.iter().map(|s| s.year).max(),
            })
        })
        .collect();
    json!({"status": "success", "matches": themes.len(), "themes": themes})
}

fn get_subthemes(store: &Store, theme: &str) -> Value {
    let mut subthemes: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for set in store.sets.iter().filter(|s| s.theme == theme) {
        subthemes.entry(set.subtheme.as_str()).or_default().push(set.year);
    }
    let subthemes: Vec<Value> = subthemes
        .into_iter()
        .map(|(subtheme, years)| {
            json!({
                "theme": theme,
                "subtheme": subtheme,
                "setCount": years.len(),
                "yearFrom": years.iter().min(),
                "yearTo": years.iter().max(),
            })
        })
        .collect();
    json!({"status": "success", "matches": subthemes.len(), "subthemes": subthemes})
}

fn get_years(store: &Store, theme: &str) -> Value {
    let mut years: BTreeMap<u32, usize> = BTreeMap::new();
    for set in store.sets.iter().filter(|s| s.theme == theme) {
        *years.entry(set.year).or_default() += 1;
    }
    let years: Vec<Value> = years
        .into_iter()
        .map(|(year, count)| json!({"theme": theme, "year": year.to_string(), "setCount": count}))
        .collect();
    json!({"status": "success", "matches": years.len(), "years": years})
}

fn set_json(set: &SetRecord, entry: Option<&CollectionEntry>) -> Value {
    let entry = entry.cloned().unwrap_or_default();
    json!({
        "setID": set.set_id,
        "number": set.number,
        "numberVariant": 1,
        "name": set.name,
        "year": set.year,
        "theme": set.theme,
        "subtheme": set.subtheme,
        "released": true,
        "pieces": set.pieces,
        "bricksetURL": format!("https://brickset.com/sets/{}-1", set.number),
        "collection": {
            "owned": entry.own,
            "wanted": entry.want,
            "qtyOwned": entry.qty_owned,
            "rating": entry.rating,
            "notes": entry.notes,
        },
        "instructionsCount": set.instructions.len(),
        "additionalImageCount": set.additional_images.len(),
        "reviewCount": set.reviews.len(),
    })
}

fn get_sets(store: &Store, fields: &Fields) -> Value {
    let params = match params(fields) {
        Ok(params) => params,
        Err(body) => return body,
    };
    // Anonymous searches are allowed; a non-empty hash must be valid.
    let username = if field(fields, "userHash").is_empty() {
        None
    } else {
        match user(store, fields) {
            Ok(username) => Some(username),
            Err(body) => return body,
        }
    };
    let collection = username.and_then(|u| store.set_collections.get(u));

    let theme = text(params.get("theme"));
    let subtheme = text(params.get("subtheme"));
    let set_number = text(params.get("setNumber"));
    let years: Option<Vec<String>> = text(params.get("year"))
        .map(|y| y.split(',').map(|s| s.trim().to_string()).collect());
    let owned = flag(params.get("owned"));
    let wanted = flag(params.get("wanted"));
    let page_size = number(params.get("pageSize")).unwrap_or(20) as usize;

    let matching: Vec<Value> = store
        .sets
        .iter()
        .filter(|s| theme.as_deref().map_or(true, |t| s.theme == t))
        .filter(|s| subtheme.as_deref().map_or(true, |t| s.subtheme == t))
        .filter(|s| {
            set_number
                .as_deref()
                .map_or(true, |n| s.number == n || format!("{}-1", s.number) == n)
        })
        .filter(|s| years.as_ref().map_or(true, |ys| ys.contains(&s.year.to_string())))
        .filter(|s| {
            let entry = collection.and_then(|c| c.get(&s.set_id));
            owned.map_or(true, |o| !o || entry.is_some_and(|e| e.own))
                && wanted.map_or(true, |w| !w || entry.is_some_and(|e| e.want))
        })
        .map(|s| set_json(s, collection.and_then(|c| c.get(&s.set_id))))
        .collect();

    let matches = matching.len();
    let sets: Vec<Value> = matching.into_iter().take(page_size).collect();
    json!({"status": "success", "matches": matches, "sets": sets})
}

fn set_lookup(
    store: &Store,
    fields: &Fields,
    key: &str,
    select: impl Fn(&SetRecord) -> &Vec<Value>,
) -> Value {
    let set_id: Option<u64> = field(fields, "setID").parse().ok();
    let items: Vec<Value> = store
        .sets
        .iter()
        .find(|s| Some(s.set_id) == set_id)
        .map(|s| select(s).clone())
        .unwrap_or_default();
    let mut body = json!({"status": "success", "matches": items.len()});
    body[key] = Value::Array(items);
    body
}

fn get_minifig_collection(store: &Store, fields: &Fields) -> Value {
    let (username, params) = match user(store, fields).and_then(|u| Ok((u, params(fields)?))) {
        Ok(found) => found,
        Err(body) => return body,
    };
    let owned = flag(params.get("owned"));
    let wanted = flag(params.get("wanted"));
    let query = text(params.get("query")).map(|q| q.to_lowercase());
    let collection = store.minifig_collections.get(username);

    let minifigs: Vec<Value> = store
        .minifigs
        .iter()
        .filter_map(|m| {
            let entry = collection.and_then(|c| c.get(&m.number));
            if owned == Some(true) && !entry.is_some_and(|e| e.own) {
                return None;
            }
            if wanted == Some(true) && !entry.is_some_and(|e| e.want) {
                return None;
            }
            if let Some(q) = &query {
                if !m.name.to_lowercase().contains(q) && !m.number.contains(q.as_str()) {
                    return None;
                }
            }
            let entry = entry.cloned().unwrap_or_default();
            Some(json!({
                "minifigNumber": m.number,
                "name": m.name,
                "category": m.category,
                "ownedInSets": 0,
                "ownedLoose": entry.qty_owned,
                "ownedTotal": entry.qty_owned,
                "wanted": entry.want,
            }))
        })
        .collect();
    json!({"status": "success", "matches": minifigs.len(), "minifigs": minifigs})
}

/// Apply the set fields of `params` to `entry`; `""` leaves a field alone.
fn apply(entry: &mut CollectionEntry, params: &Map<String, Value>) {
    if let Some(own) = flag(params.get("own")) {
        entry.own = own;
        if own && entry.qty_owned == 0 {
            entry.qty_owned = 1;
        }
    }
    if let Some(want) = flag(params.get("want")) {
        entry.want = want;
    }
    if let Some(qty) = number(params.get("qtyOwned")) {
        entry.qty_owned = qty;
        entry.own = qty > 0;
    }
    if let Some(notes) = text(params.get("notes")) {
        entry.notes = notes;
    }
    if let Some(rating) = number(params.get("rating")) {
        entry.rating = rating;
    }
}

fn set_collection(store: &mut Store, fields: &Fields) -> Value {
    let (username, params) = match user(store, fields).and_then(|u| Ok((u.to_string(), params(fields)?))) {
        Ok(found) => found,
        Err(body) => return body,
    };
    let Some(set_id) = field(fields, "SetID")
        .parse::<u64>()
        .ok()
        .filter(|id| store.sets.iter().any(|s| s.set_id == *id))
    else {
        return error_body("Invalid SetID");
    };
    let entry = store
        .set_collections
        .entry(username)
        .or_default()
        .entry(set_id)
        .or_default();
    apply(entry, &params);
    json!({"status": "success"})
}

fn set_minifig_collection(store: &mut Store, fields: &Fields) -> Value {
    let (username, params) = match user(store, fields).and_then(|u| Ok((u.to_string(), params(fields)?))) {
        Ok(found) => found,
        Err(body) => return body,
    };
    let number = field(fields, "minifigNumber").to_string();
    if !store.minifigs.iter().any(|m| m.number == number) {
        return error_body("Invalid minifigNumber");
    }
    let entry = store
        .minifig_collections
        .entry(username)
        .or_default()
        .entry(number)
        .or_default();
    apply(entry, &params);
    json!({"status": "success"})
}

fn get_user_notes(store: &Store, fields: &Fields) -> Value {
    let username = match user(store, fields) {
        Ok(username) => username,
        Err(body) => return body,
    };
    let notes: Vec<Value> = store
        .set_collections
        .get(username)
        .into_iter()
        .flatten()
        .filter(|(_, e)| !e.notes.is_empty())
        .map(|(set_id, e)| json!({"setID": set_id, "notes": e.notes}))
        .collect();
    json!({"status": "success", "matches": notes.len(), "userNotes": notes})
}

fn get_user_minifig_notes(store: &Store, fields: &Fields) -> Value {
    let username = match user(store, fields) {
        Ok(username) => username,
        Err(body) => return body,
    };
    let notes: Vec<Value> = store
        .minifig_collections
        .get(username)
        .into_iter()
        .flatten()
        .filter(|(_, e)| !e.notes.is_empty())
        .map(|(number, e)| json!({"minifigNumber": number, "notes": e.notes}))
        .collect();
    json!({"status": "success", "matches": notes.len(), "userMinifigNotes": notes})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn flag_treats_empty_string_as_unset() {
        assert_eq!(flag(Some(&json!(""))), None);
        assert_eq!(flag(Some(&json!(1))), Some(true));
        assert_eq!(flag(Some(&json!(0))), Some(false));
        assert_eq!(flag(Some(&json!("1"))), Some(true));
        assert_eq!(flag(None), None);
    }

    #[test]
    fn text_and_number_accept_both_encodings() {
        assert_eq!(text(Some(&json!(""))), None);
        assert_eq!(text(Some(&json!(2008))).as_deref(), Some("2008"));
        assert_eq!(number(Some(&json!("5"))), Some(5));
        assert_eq!(number(Some(&json!(""))), None);
    }

    #[test]
    fn get_sets_filters_by_theme_and_year() {
        let store = seed();
        let body = get_sets(
            &store,
            &fields(&[("params", r#"{"theme":"Indiana Jones","year":"2009","pageSize":500}"#)]),
        );
        assert_eq!(body["matches"], 1);
        assert_eq!(body["sets"][0]["name"], "The Temple of Doom");
    }

    #[test]
    fn get_sets_honours_page_size() {
        let store = seed();
        let body = get_sets(&store, &fields(&[("params", r#"{"pageSize":2}"#)]));
        assert_eq!(body["matches"], 5);
        assert_eq!(body["sets"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn get_sets_rejects_bad_params() {
        let store = seed();
        let body = get_sets(&store, &fields(&[("params", "{not json")]));
        assert_eq!(body["status"], "error");
    }

    #[test]
    fn set_lookup_unknown_id_has_zero_matches() {
        let store = seed();
        let body = set_lookup(&store, &fields(&[("setID", "0000")]), "instructions", |s| &s.instructions);
        assert_eq!(body["status"], "success");
        assert_eq!(body["matches"], 0);
        assert_eq!(body["instructions"], json!([]));
    }

    #[test]
    fn apply_ignores_empty_sentinels() {
        let mut entry = CollectionEntry {
            own: true,
            qty_owned: 3,
            notes: "keep".to_string(),
            ..CollectionEntry::default()
        };
        let params: Map<String, Value> =
            serde_json::from_str(r#"{"own":"","want":1,"qtyOwned":"","notes":"","rating":""}"#).unwrap();
        apply(&mut entry, &params);
        assert!(entry.own);
        assert!(entry.want);
        assert_eq!(entry.qty_owned, 3);
        assert_eq!(entry.notes, "keep");
    }

    #[test]
    fn login_mints_a_session() {
        let mut store = seed();
        let body = login(&mut store, &fields(&[("username", USERNAME), ("password", PASSWORD)]));
        assert_eq!(body["status"], "success");
        let hash = body["hash"].as_str().unwrap();
        assert_eq!(store.sessions.get(hash).map(String::as_str), Some(USERNAME));
    }
}

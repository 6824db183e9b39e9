//! Request builder and response classifier for the Brickset v3 API.
//!
//! # Design
//! Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a public call method that runs it through the
//! `Transport`, then classifies the decoded envelope with the pure helpers
//! in [`crate::response`]. The `build_*` half is deterministic and never
//! touches the network.
//!
//! The only mutable state is `user_hash`, written by `login` and cleared by
//! `logout`. Both take `&mut self`; every other call takes `&self`. Login is
//! never enforced locally: user-scoped calls without a hash are sent anyway
//! and the remote's error comes back as `Error::InvalidRequest`.
//!
//! # Panics
//! A transport failure or a non-2xx status panics. The remote reports every
//! domain failure inside a 200 response, so anything else means the
//! environment is broken rather than the request.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, Transport, UreqTransport};
use crate::params::{
    GetSetsParams, MinifigCollectionParams, MinifigCollectionUpdate, OwnedOnly, SetCollectionParams,
};
use crate::response;
use crate::types::{
    AdditionalImage, Instruction, Minifig, Review, Set, Subtheme, Theme, UserMinifigNote, UserNote,
    Year,
};

/// Blocking client for the Brickset v3 API.
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    api_key: String,
    user_hash: String,
}

impl<T: fmt::Debug> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("api_key", &"<redacted>")
            .field("logged_in", &!self.user_hash.is_empty())
            .finish()
    }
}

impl ApiClient<UreqTransport> {
    /// Connect to Brickset with the default configuration and check `api_key`.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_config(api_key, ClientConfig::default())
    }

    pub fn with_config(api_key: &str, config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(api_key, config, transport)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build a client over `transport` and check `api_key` against the remote.
    ///
    /// Fails with `InvalidApiKey` if the remote rejects the key.
    pub fn with_transport(api_key: &str, config: ClientConfig, transport: T) -> Result<Self> {
        let client = Self {
            config,
            transport,
            api_key: api_key.to_string(),
            user_hash: String::new(),
        };
        client.check_api_key(None)?;
        Ok(client)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Session hash from the last successful login; empty otherwise.
    pub fn user_hash(&self) -> &str {
        &self.user_hash
    }

    pub fn is_logged_in(&self) -> bool {
        !self.user_hash.is_empty()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_check_key(&self, api_key: &str) -> HttpRequest {
        self.request("checkKey", vec![("apiKey", api_key.to_string())])
    }

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        self.form(
            "login",
            vec![
                ("username", username.to_string()),
                ("password", password.to_string()),
            ],
        )
    }

    pub fn build_get_themes(&self) -> HttpRequest {
        self.form("getThemes", Vec::new())
    }

    pub fn build_get_subthemes(&self, theme: &str) -> HttpRequest {
        self.form("getSubthemes", vec![("Theme", theme.to_string())])
    }

    pub fn build_get_years(&self, theme: &str) -> HttpRequest {
        self.form("getYears", vec![("Theme", theme.to_string())])
    }

    pub fn build_get_sets(&self, params: &GetSetsParams) -> Result<HttpRequest> {
        Ok(self.user_form("getSets", vec![("params", encode_params(params)?)]))
    }

    pub fn build_get_instructions(&self, set_id: &str) -> HttpRequest {
        self.form("getInstructions", vec![("setID", set_id.to_string())])
    }

    pub fn build_get_additional_images(&self, set_id: &str) -> HttpRequest {
        self.form("getAdditionalImages", vec![("setID", set_id.to_string())])
    }

    pub fn build_get_reviews(&self, set_id: &str) -> HttpRequest {
        self.form("getReviews", vec![("setID", set_id.to_string())])
    }

    pub fn build_get_minifig_collection_owned(&self) -> Result<HttpRequest> {
        let params = encode_params(&OwnedOnly { owned: 1 })?;
        Ok(self.user_form("getMinifigCollection", vec![("params", params)]))
    }

    pub fn build_get_minifig_collection(
        &self,
        params: &MinifigCollectionParams,
    ) -> Result<HttpRequest> {
        Ok(self.user_form("getMinifigCollection", vec![("params", encode_params(params)?)]))
    }

    pub fn build_set_collection(
        &self,
        set_id: &str,
        params: &SetCollectionParams,
    ) -> Result<HttpRequest> {
        Ok(self.user_form(
            "setCollection",
            vec![("SetID", set_id.to_string()), ("params", encode_params(params)?)],
        ))
    }

    pub fn build_set_minifig_collection(
        &self,
        minifig_number: &str,
        params: &MinifigCollectionUpdate,
    ) -> Result<HttpRequest> {
        Ok(self.user_form(
            "setMinifigCollection",
            vec![
                ("minifigNumber", minifig_number.to_string()),
                ("params", encode_params(params)?),
            ],
        ))
    }

    pub fn build_get_user_notes(&self) -> HttpRequest {
        self.user_form("getUserNotes", Vec::new())
    }

    pub fn build_get_user_minifig_notes(&self) -> HttpRequest {
        self.user_form("getUserMinifigNotes", Vec::new())
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    /// Check `api_key`, or the client's own key when `None` or empty.
    pub fn check_api_key(&self, api_key: Option<&str>) -> Result<()> {
        let key = api_key.filter(|k| !k.is_empty()).unwrap_or(&self.api_key);
        let envelope = self.execute("checkKey", self.build_check_key(key))?;
        if response::is_error(&envelope)? {
            warn!("API key rejected");
            return Err(Error::InvalidApiKey(key.to_string()));
        }
        Ok(())
    }

    /// Log in and keep the returned session hash for user-scoped calls.
    ///
    /// On failure the previous hash is left untouched.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let envelope = self.execute("login", self.build_login(username, password))?;
        if response::is_error(&envelope)? {
            warn!(username, "login rejected");
            return Err(Error::InvalidLoginCredentials(response::message(&envelope)));
        }
        let hash: String = response::extract(envelope, "hash")?;
        self.user_hash = hash;
        info!(username, "logged in");
        Ok(())
    }

    /// Forget the session hash. No remote call is made.
    pub fn logout(&mut self) {
        if self.is_logged_in() {
            info!("logged out");
        }
        self.user_hash.clear();
    }

    pub fn get_themes(&self) -> Result<Vec<Theme>> {
        self.call("getThemes", self.build_get_themes(), "themes")
    }

    pub fn get_subthemes(&self, theme: &str) -> Result<Vec<Subtheme>> {
        self.call("getSubthemes", self.build_get_subthemes(theme), "subthemes")
    }

    pub fn get_years(&self, theme: &str) -> Result<Vec<Year>> {
        self.call("getYears", self.build_get_years(theme), "years")
    }

    /// Search sets. Sends the session hash when logged in so that the
    /// `owned`/`wanted` filters and per-user collection fields apply.
    pub fn get_sets(&self, params: &GetSetsParams) -> Result<Vec<Set>> {
        self.call("getSets", self.build_get_sets(params)?, "sets")
    }

    pub fn get_instructions(&self, set_id: &str) -> Result<Vec<Instruction>> {
        let request = self.build_get_instructions(set_id);
        self.call_for_set("getInstructions", request, set_id, "instructions")
    }

    pub fn get_additional_images(&self, set_id: &str) -> Result<Vec<AdditionalImage>> {
        let request = self.build_get_additional_images(set_id);
        self.call_for_set("getAdditionalImages", request, set_id, "additionalImages")
    }

    pub fn get_reviews(&self, set_id: &str) -> Result<Vec<Review>> {
        let request = self.build_get_reviews(set_id);
        self.call_for_set("getReviews", request, set_id, "reviews")
    }

    /// Minifigs the logged-in user owns.
    pub fn get_minifig_collection_owned(&self) -> Result<Vec<Minifig>> {
        let request = self.build_get_minifig_collection_owned()?;
        self.call("getMinifigCollection", request, "minifigs")
    }

    pub fn get_minifig_collection(&self, params: &MinifigCollectionParams) -> Result<Vec<Minifig>> {
        let request = self.build_get_minifig_collection(params)?;
        self.call("getMinifigCollection", request, "minifigs")
    }

    /// Update the user's collection entry for a set. Returns the remote status.
    pub fn set_collection(&self, set_id: &str, params: &SetCollectionParams) -> Result<String> {
        let request = self.build_set_collection(set_id, params)?;
        self.call("setCollection", request, "status")
    }

    /// Update the user's collection entry for a minifig. Returns the remote status.
    pub fn set_minifig_collection(
        &self,
        minifig_number: &str,
        params: &MinifigCollectionUpdate,
    ) -> Result<String> {
        let request = self.build_set_minifig_collection(minifig_number, params)?;
        self.call("setMinifigCollection", request, "status")
    }

    pub fn get_user_notes(&self) -> Result<Vec<UserNote>> {
        self.call("getUserNotes", self.build_get_user_notes(), "userNotes")
    }

    pub fn get_user_minifig_notes(&self) -> Result<Vec<UserMinifigNote>> {
        self.call("getUserMinifigNotes", self.build_get_user_minifig_notes(), "userMinifigNotes")
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn request(&self, endpoint: &str, fields: Vec<(&str, String)>) -> HttpRequest {
        HttpRequest {
            url: self.config.endpoint_url(endpoint),
            form: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Form with `apiKey` first.
    fn form(&self, endpoint: &str, mut fields: Vec<(&str, String)>) -> HttpRequest {
        fields.insert(0, ("apiKey", self.api_key.clone()));
        self.request(endpoint, fields)
    }

    /// Form with `apiKey` and `userHash` first.
    fn user_form(&self, endpoint: &str, mut fields: Vec<(&str, String)>) -> HttpRequest {
        fields.insert(0, ("userHash", self.user_hash.clone()));
        self.form(endpoint, fields)
    }

    /// POST and decode. Panics on transport failure or a non-2xx status.
    fn execute(&self, endpoint: &str, request: HttpRequest) -> Result<Value> {
        debug!(endpoint, fields = ?request.field_names(), "posting request");
        let response = match self.transport.post(&request) {
            Ok(response) => response,
            Err(e) => panic!("{endpoint} request failed: {e}"),
        };
        if !response.is_success() {
            panic!("{endpoint} returned HTTP {}: {}", response.status, response.body);
        }
        response::decode(&response.body)
    }

    fn call<R: DeserializeOwned>(&self, endpoint: &str, request: HttpRequest, field: &str) -> Result<R> {
        let envelope = self.execute(endpoint, request)?;
        self.check(endpoint, &envelope)?;
        response::extract(envelope, field)
    }

    fn call_for_set<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: HttpRequest,
        set_id: &str,
        field: &str,
    ) -> Result<R> {
        let envelope = self.execute(endpoint, request)?;
        self.check(endpoint, &envelope)?;
        response::check_set_id(&envelope, set_id)?;
        response::extract(envelope, field)
    }

    fn check(&self, endpoint: &str, envelope: &Value) -> Result<()> {
        if let Err(e) = response::check_response(envelope) {
            warn!(endpoint, error = %e, "remote reported an error");
            return Err(e);
        }
        Ok(())
    }
}

fn encode_params<P: Serialize>(params: &P) -> Result<String> {
    serde_json::to_string(params).map_err(|e| Error::Serialization(e.to_string()))
}

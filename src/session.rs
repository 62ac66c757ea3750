use std::fmt;
use std::path::Path;
use std::time::Instant;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, RequestBuilder};

use crate::archive::PackedCatalog;
use crate::config::ExchangeConfig;
use crate::phases::sequence;
use crate::protocol::Negotiated;
use crate::response::{classify, Reply, Step};
use crate::{ExchangeError, Result};

/// Value of the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeType {
    Catalog,
    Sale,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Catalog => "catalog",
            ExchangeType::Sale => "sale",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP session with an exchange endpoint.
///
/// Steps must be issued in protocol order: [`authenticate`] first, then
/// [`initialize`], the catalog or order steps, and [`finish`]. The first
/// failing step ends the exchange; nothing is rolled back on the server.
///
/// [`authenticate`]: ExchangeSession::authenticate
/// [`initialize`]: ExchangeSession::initialize
/// [`finish`]: ExchangeSession::finish
pub struct ExchangeSession {
    config: ExchangeConfig,
    client: Client,
    negotiated: Option<Negotiated>,
    requests_sent: u64,
}

impl ExchangeSession {
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .default_headers(config.headers()?);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
            negotiated: None,
            requests_sent: 0,
        })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Protocol settled by [`ExchangeSession::authenticate`], if it ran
    pub fn negotiated(&self) -> Option<&Negotiated> {
        self.negotiated.as_ref()
    }

    /// Number of HTTP requests issued so far
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Pack `catalog`, upload it and drive every data file through the
    /// server-side import in phase order.
    ///
    /// The archive is removed when this returns, whatever the outcome.
    pub async fn import_catalog<P: AsRef<Path>>(
        &mut self,
        catalog: P,
    ) -> Result<()> {
        let catalog = catalog.as_ref();
        log::info!("Used catalog {}", catalog.display());

        let packed = PackedCatalog::pack(catalog, &self.config.archive_name)?;
        if packed.data_files().is_empty() {
            return Err(ExchangeError::Input(
                "Not found files for import".to_owned(),
            ));
        }
        log::info!("Found {} files for import", packed.data_files().len());

        let files = sequence(packed.data_files());
        log::debug!("Import order: {:?}", files);

        log::info!("Communicate with {}", self.config.endpoint);
        self.authenticate().await?;
        self.initialize(ExchangeType::Catalog).await?;
        self.upload(packed.path()).await?;
        for file in &files {
            self.import_until_done(file).await?;
        }
        self.finish().await?;

        packed.close()
    }

    /// Fetch the orders waiting for export and return the raw reply.
    pub async fn export_orders(&mut self) -> Result<String> {
        log::info!("Communicate with {}", self.config.endpoint);
        self.authenticate().await?;
        self.initialize(ExchangeType::Sale).await?;
        let orders = self.query_orders().await?;
        self.finish().await?;
        Ok(orders)
    }

    /// Blocking version of [`ExchangeSession::import_catalog`]
    pub fn import_catalog_sync<P: AsRef<Path>>(
        &mut self,
        catalog: P,
    ) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.import_catalog(catalog))
    }

    /// Blocking version of [`ExchangeSession::export_orders`]
    pub fn export_orders_sync(&mut self) -> Result<String> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.export_orders())
    }

    /// Check credentials and settle the protocol version.
    ///
    /// This is the only request carrying basic authentication, later steps
    /// ride on the session cookie.
    pub async fn authenticate(&mut self) -> Result<&Negotiated> {
        log::info!("Authorisation");
        let request = self
            .request(ExchangeType::Sale, Step::CheckAuth)
            .basic_auth(
                &self.config.credentials.login,
                Some(&self.config.credentials.password),
            );
        let (_, body) = self.send(Step::CheckAuth, request).await?;

        let negotiated = self.config.protocol.negotiate(&body)?;
        Ok(&*self.negotiated.insert(negotiated))
    }

    pub async fn initialize(&mut self, exchange: ExchangeType) -> Result<()> {
        log::info!("Initialize");
        let request = self.session_request(exchange, Step::Init)?;
        self.send(Step::Init, request).await?;
        Ok(())
    }

    /// Send the packed catalog as the request body.
    pub async fn upload<P: AsRef<Path>>(&mut self, archive: P) -> Result<()> {
        log::info!("Load file on server");
        self.session()?;
        let file = tokio::fs::File::open(archive.as_ref()).await?;
        let length = file.metadata().await?.len();
        log::debug!("Uploading {} bytes", length);

        let request = self
            .client
            .post(self.config.endpoint.clone())
            .query(&[
                ("type", ExchangeType::Catalog.as_str()),
                ("mode", Step::Upload.mode()),
                ("filename", self.config.archive_name.as_str()),
            ])
            .header(CONTENT_LENGTH, length)
            .body(file);
        self.send(Step::Upload, request).await?;
        Ok(())
    }

    /// Ask the server to import one data file from the uploaded archive.
    pub async fn import(&mut self, file: &str) -> Result<Reply> {
        log::info!("Import {}", file);
        let request = self
            .session_request(ExchangeType::Catalog, Step::Import)?
            .query(&[("filename", file)]);
        let (reply, _) = self.send(Step::Import, request).await?;
        Ok(reply)
    }

    /// Repeat the import request for `file` for as long as the server
    /// reports progress, returning how many requests it took.
    ///
    /// Without a configured [`PollGuard`](crate::PollGuard) this never gives
    /// up on a server that stays busy.
    pub async fn import_until_done(&mut self, file: &str) -> Result<u64> {
        let guard = self.config.poll_guard;
        let started = Instant::now();
        let mut polls = 0;

        loop {
            polls += 1;
            if self.import(file).await? == Reply::Done {
                return Ok(polls);
            }

            let polls_exhausted =
                guard.max_polls.map_or(false, |max| polls >= max);
            let deadline_passed = guard
                .deadline
                .map_or(false, |deadline| started.elapsed() >= deadline);
            if polls_exhausted || deadline_passed {
                return Err(ExchangeError::PollLimit {
                    file: file.to_owned(),
                    polls,
                });
            }
        }
    }

    /// Fetch pending orders. The reply is passed through untouched.
    pub async fn query_orders(&mut self) -> Result<String> {
        log::info!("Get orders list");
        let request = self.session_request(ExchangeType::Sale, Step::Query)?;
        let (_, body) = self.send(Step::Query, request).await?;
        Ok(body)
    }

    /// Tell the server the exchange is over. Always sent as `type=sale`.
    pub async fn finish(&mut self) -> Result<()> {
        log::info!("Finalize");
        let request = self.session_request(ExchangeType::Sale, Step::Success)?;
        self.send(Step::Success, request).await?;
        Ok(())
    }

    fn session(&self) -> Result<&Negotiated> {
        self.negotiated.as_ref().ok_or_else(|| {
            let message = "Session is not authorised";
            ExchangeError::Authentication(message.to_owned())
        })
    }

    fn request(&self, exchange: ExchangeType, step: Step) -> RequestBuilder {
        self.client
            .get(self.config.endpoint.clone())
            .query(&[("type", exchange.as_str()), ("mode", step.mode())])
    }

    fn session_request(
        &self,
        exchange: ExchangeType,
        step: Step,
    ) -> Result<RequestBuilder> {
        let params = self.session()?.params();
        Ok(self.request(exchange, step).query(&params))
    }

    async fn send(
        &mut self,
        step: Step,
        request: RequestBuilder,
    ) -> Result<(Reply, String)> {
        self.requests_sent += 1;
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::trace!("{} replied {} with {} bytes", step, status, body.len());

        let reply = classify(step, status, &body)?;
        Ok((reply, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use url::Url;

    fn session() -> ExchangeSession {
        let endpoint = Url::parse("http://127.0.0.1:9/exchange.php").unwrap();
        ExchangeSession::new(ExchangeConfig::new(
            endpoint,
            Credentials::new("admin", "secret"),
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn steps_require_authentication() {
        let mut session = session();

        assert!(matches!(
            session.initialize(ExchangeType::Catalog).await,
            Err(ExchangeError::Authentication(_))
        ));
        assert!(matches!(
            session.import("import_1.xml").await,
            Err(ExchangeError::Authentication(_))
        ));
        assert!(matches!(
            session.upload("catalog.zip").await,
            Err(ExchangeError::Authentication(_))
        ));
        assert!(matches!(
            session.finish().await,
            Err(ExchangeError::Authentication(_))
        ));
        assert_eq!(session.requests_sent(), 0);
        assert!(session.negotiated().is_none());
    }

    #[tokio::test]
    async fn empty_catalog_sends_nothing() {
        let catalog = tempfile::tempdir().unwrap();
        std::fs::write(catalog.path().join("readme.txt"), "no data").unwrap();

        let mut session = session();
        let result = session.import_catalog(catalog.path()).await;

        assert!(matches!(result, Err(ExchangeError::Input(_))));
        assert_eq!(session.requests_sent(), 0);
    }

    #[test]
    fn exchange_type_names() {
        assert_eq!(ExchangeType::Catalog.to_string(), "catalog");
        assert_eq!(ExchangeType::Sale.to_string(), "sale");
    }
}

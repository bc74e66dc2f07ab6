use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::{Http, Middleware, Provider, Quorum, QuorumProvider, WeightedProvider};
use reqwest::Client;
use thiserror::Error;

use vibc_core::{Address, ChainCommunicationError, ChainLogSource, ChainResult};

use crate::{ConnectionConf, EthereumLogSource};

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// An error when connecting to an ethereum provider.
#[derive(Error, Debug)]
pub enum EthereumProviderConnectionError {
    /// Underlying reqwest lib threw an error
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    /// A URL string could not be parsed
    #[error("Failed to parse url {1:?}: {0}")]
    InvalidUrl(url::ParseError, String),
    /// A connection was configured without any urls
    #[error("No rpc urls configured")]
    NoUrls,
}

impl From<EthereumProviderConnectionError> for ChainCommunicationError {
    fn from(e: EthereumProviderConnectionError) -> Self {
        ChainCommunicationError::from_other(e)
    }
}

/// A trait for dynamic trait creation with provider initialization.
pub trait BuildableWithProvider {
    /// The type that will be created.
    type Output;

    /// Construct a new instance of the associated trait using a connection
    /// config. The dispatcher is the contract whose logs are read.
    fn build_with_connection_conf(
        &self,
        conn: ConnectionConf,
        dispatcher: Address,
    ) -> ChainResult<Self::Output> {
        let http_client = Client::builder()
            .timeout(HTTP_CLIENT_TIMEOUT)
            .build()
            .map_err(EthereumProviderConnectionError::from)?;
        Ok(match conn {
            ConnectionConf::HttpQuorum { urls } => {
                if urls.is_empty() {
                    return Err(EthereumProviderConnectionError::NoUrls.into());
                }
                let mut builder = QuorumProvider::builder().quorum(Quorum::Majority);
                for url in urls {
                    let http_provider = Http::new_with_client(url, http_client.clone());
                    builder = builder.add_provider(WeightedProvider::new(http_provider));
                }
                self.build_with_provider(Provider::new(builder.build()), dispatcher)
            }
            ConnectionConf::Http { url } => {
                let http_provider = Http::new_with_client(url, http_client);
                self.build_with_provider(Provider::new(http_provider), dispatcher)
            }
        })
    }

    /// Construct a new instance of the associated trait using a provider.
    fn build_with_provider<M>(&self, provider: M, dispatcher: Address) -> Self::Output
    where
        M: Middleware + 'static;
}

/// Builds type-erased dispatcher log sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSourceBuilder;

impl BuildableWithProvider for LogSourceBuilder {
    type Output = Arc<dyn ChainLogSource>;

    fn build_with_provider<M>(&self, provider: M, dispatcher: Address) -> Self::Output
    where
        M: Middleware + 'static,
    {
        Arc::new(EthereumLogSource::new(Arc::new(provider), dispatcher))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_quorum_is_rejected() {
        let err = LogSourceBuilder
            .build_with_connection_conf(
                ConnectionConf::HttpQuorum { urls: vec![] },
                Address::zero(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("No rpc urls configured"));
    }

    #[test]
    fn builds_http_source_without_touching_the_network() {
        let source = LogSourceBuilder
            .build_with_connection_conf(
                ConnectionConf::Http {
                    url: "http://127.0.0.1:8545".parse().unwrap(),
                },
                Address::repeat_byte(0xd1),
            )
            .unwrap();
        assert!(format!("{source:?}").contains("EthereumLogSource"));
    }
}

use std::str::FromStr;

use url::Url;

use crate::EthereumProviderConnectionError;

/// Ethereum RPC connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConf {
    /// An HTTP-only quorum.
    HttpQuorum {
        /// List of urls to connect to
        urls: Vec<Url>,
    },
    /// HTTP connection details
    Http {
        /// Url to connect to
        url: Url,
    },
}

/// Parses a comma separated list of rpc urls. A single url is a plain http
/// connection, several form a majority quorum.
impl FromStr for ConnectionConf {
    type Err = EthereumProviderConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut urls = s
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| {
                url.parse::<Url>()
                    .map_err(|e| EthereumProviderConnectionError::InvalidUrl(e, url.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match urls.len() {
            0 => Err(EthereumProviderConnectionError::NoUrls),
            1 => Ok(ConnectionConf::Http { url: urls.remove(0) }),
            _ => Ok(ConnectionConf::HttpQuorum { urls }),
        }
    }
}

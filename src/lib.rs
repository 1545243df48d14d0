// Biblioteca do servidor Slack Lists
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod utils;

use slack_lists::ListOperations;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub operations: ListOperations,
}

impl AppState {
    /// Monta o estado a partir das configurações já carregadas
    pub fn new(settings: config::Settings) -> slack_lists::Result<Self> {
        let operations = ListOperations::new(settings.client_config()?)?;
        Ok(Self {
            settings,
            operations,
        })
    }
}

//! Iteração paginada por cursor
//!
//! `ItemPager` é uma sequência preguiçosa: nenhuma página é buscada antes do
//! primeiro pedido, e a página N+1 só é pedida depois que a página N chegou
//! (o cursor da próxima depende da resposta anterior). A sequência termina
//! somente quando a API não devolve `next_cursor`.
//!
//! Para recomeçar do início basta criar outro pager; cursores nunca são
//! compartilhados entre instâncias.

use crate::error::{Result, SlackListsError};
use crate::filters::FilterEngine;
use crate::types::{Item, ItemsPage};
use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use std::collections::VecDeque;

/// Parâmetros de uma chamada `slackLists.items.list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub list_id: String,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub archived: bool,
}

impl PageQuery {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }
}

/// Fonte de páginas. Implementada por `ListOperations` (via executor resiliente).
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ItemsPage>;
}

/// Ponto de retomada de uma leitura filtrada
///
/// Quando uma página remota rende mais itens que o pedido, o restante não
/// pode ser pulado: o cursor devolvido volta para a mesma página e descarta
/// os `skip` primeiros itens brutos já consumidos. `page_size` precisa ser o
/// mesmo da leitura original para a página ser idêntica.
///
/// Cursores da própria API (sem o prefixo) são aceitos com `skip = 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeToken {
    pub cursor: Option<String>,
    pub page_size: Option<u32>,
    pub skip: usize,
}

const RESUME_PREFIX: &str = "resume:";

impl ResumeToken {
    /// `resume:{skip}:{page_size}:{cursor}`
    pub fn encode(&self) -> String {
        format!(
            "{}{}:{}:{}",
            RESUME_PREFIX,
            self.skip,
            self.page_size.unwrap_or(0),
            self.cursor.as_deref().unwrap_or("")
        )
    }

    pub fn parse(cursor: &str) -> Result<Self> {
        let Some(rest) = cursor.strip_prefix(RESUME_PREFIX) else {
            return Ok(Self {
                cursor: Some(cursor.to_string()).filter(|c| !c.is_empty()),
                ..Default::default()
            });
        };

        let invalid = || SlackListsError::ValidationError(format!("Invalid cursor: {}", cursor));
        let mut parts = rest.splitn(3, ':');
        let skip = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let page_size: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let remote = parts.next().ok_or_else(invalid)?;

        Ok(Self {
            cursor: Some(remote.to_string()).filter(|c| !c.is_empty()),
            page_size: Some(page_size).filter(|size| *size > 0),
            skip,
        })
    }
}

/// Sequência de itens de uma lista, com filtro aplicado antes de entregar
pub struct ItemPager<'a, S: PageSource + ?Sized> {
    source: &'a S,
    query: PageQuery,
    filter: FilterEngine,
    /// Itens ainda não entregues da última página, com o índice bruto na página
    buffer: VecDeque<(usize, Item)>,
    /// Cursor usado para buscar a página que está no buffer
    buffered_cursor: Option<String>,
    /// Itens brutos a descartar no início da próxima página buscada
    skip: usize,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: PageSource + ?Sized> ItemPager<'a, S> {
    /// `query.cursor` é o ponto de partida (normalmente `None`)
    pub fn new(source: &'a S, query: PageQuery) -> Self {
        Self {
            source,
            query,
            filter: FilterEngine::default(),
            buffer: VecDeque::new(),
            buffered_cursor: None,
            skip: 0,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Retoma a partir de um `ResumeToken` (cursor, tamanho de página e descarte)
    pub fn resume(source: &'a S, query: PageQuery, token: ResumeToken) -> Self {
        let mut query = query.with_cursor(token.cursor);
        if let Some(page_size) = token.page_size {
            query.limit = Some(page_size);
        }
        let mut pager = Self::new(source, query);
        pager.skip = token.skip;
        pager
    }

    pub fn with_filter(mut self, filter: FilterEngine) -> Self {
        self.filter = filter;
        self
    }

    /// `false` somente quando não há itens em buffer nem páginas a buscar
    pub fn has_more(&self) -> bool {
        !self.buffer.is_empty() || !self.exhausted
    }

    /// Cursor da próxima página ainda não buscada
    pub fn next_cursor(&self) -> Option<&str> {
        if self.exhausted {
            None
        } else {
            self.query.cursor.as_deref()
        }
    }

    /// Cursor para continuar exatamente do próximo item não entregue
    ///
    /// Com itens em buffer, é um `ResumeToken` para a página atual; sem
    /// buffer, o cursor remoto da próxima página. `None` no fim da lista.
    pub fn resume_cursor(&self) -> Option<String> {
        match self.buffer.front() {
            Some((index, _)) => Some(
                ResumeToken {
                    cursor: self.buffered_cursor.clone(),
                    page_size: self.query.limit,
                    skip: *index,
                }
                .encode(),
            ),
            None => self.next_cursor().map(str::to_string),
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Busca uma página e coloca os itens que casam no buffer.
    /// `false` quando não há mais páginas.
    ///
    /// Em caso de erro o cursor não avança: chamar de novo repete a mesma página.
    async fn fill_buffer(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }

        let page = self.source.fetch_page(&self.query).await?;
        self.pages_fetched += 1;

        tracing::debug!(
            list_id = %self.query.list_id,
            page = self.pages_fetched,
            items = page.items.len(),
            has_more = page.has_more,
            "📄 Página recebida"
        );

        self.buffered_cursor = self.query.cursor.take();
        match page.next_cursor {
            Some(cursor) if page.has_more => self.query.cursor = Some(cursor),
            _ => self.exhausted = true,
        }

        let skip = std::mem::take(&mut self.skip);
        let filter = &self.filter;
        self.buffer.extend(
            page.items
                .into_iter()
                .enumerate()
                .skip(skip)
                .filter(|(_, item)| filter.matches(item)),
        );
        Ok(true)
    }

    /// Próximo lote de itens (já filtrado). Itens em buffer são entregues antes
    /// de buscar outra página. Uma página pode ficar vazia após o filtro.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Item>>> {
        if self.buffer.is_empty() && !self.fill_buffer().await? {
            return Ok(None);
        }
        Ok(Some(self.buffer.drain(..).map(|(_, item)| item).collect()))
    }

    pub async fn next_item(&mut self) -> Result<Option<Item>> {
        loop {
            if let Some((_, item)) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if !self.fill_buffer().await? {
                return Ok(None);
            }
        }
    }

    /// Busca páginas até reunir `total` itens ou esgotar a lista.
    /// O excedente da última página fica em buffer (ver `resume_cursor`).
    pub async fn collect_up_to(&mut self, total: usize) -> Result<Vec<Item>> {
        let mut collected = Vec::new();
        while collected.len() < total {
            if let Some((_, item)) = self.buffer.pop_front() {
                collected.push(item);
            } else if !self.fill_buffer().await? {
                break;
            }
        }
        Ok(collected)
    }

    /// Adaptador para `Stream`; termina no primeiro erro
    pub fn into_stream(self) -> impl Stream<Item = Result<Item>> + 'a
    where
        S: 'a,
    {
        stream::unfold(Some(self), |state| async move {
            let mut pager = state?;
            match pager.next_item().await {
                Ok(Some(item)) => Some((Ok(item), Some(pager))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }
}

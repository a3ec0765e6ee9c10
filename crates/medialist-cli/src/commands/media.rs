//! Membership and catalog command handlers

use anyhow::{Context, Result};

use medialist_core::{Anime, HasMediaStores, MediaEntity, MediaKind, Movie, Store, TvSeries};

use crate::output::Output;

/// Add a title to a list, storing it first if it is new
pub fn add<E>(store: &Store, list_id: i64, entity: E, output: &Output) -> Result<()>
where
    E: MediaEntity,
    Store: HasMediaStores<E>,
{
    store
        .add_to_list(list_id, &entity)
        .with_context(|| format!("Failed to add {} {} to list {}", E::KIND, entity.id(), list_id))?;
    output.success(&format!(
        "Added {} {} ({}) to list {}",
        E::KIND,
        entity.id(),
        entity.title(),
        list_id
    ));
    Ok(())
}

/// Remove a title from a list
pub fn remove(
    store: &Store,
    kind: MediaKind,
    list_id: i64,
    entity_id: i64,
    output: &Output,
) -> Result<()> {
    let result = match kind {
        MediaKind::Movie => store.remove_from_list::<Movie>(list_id, entity_id),
        MediaKind::TvSeries => store.remove_from_list::<TvSeries>(list_id, entity_id),
        MediaKind::Anime => store.remove_from_list::<Anime>(list_id, entity_id),
    };
    result.with_context(|| format!("Failed to remove {} {} from list {}", kind, entity_id, list_id))?;

    output.success(&format!("Removed {} {} from list {}", kind, entity_id, list_id));
    Ok(())
}

/// Show every stored title of a kind
pub fn catalog(store: &Store, kind: MediaKind, output: &Output) -> Result<()> {
    match kind {
        MediaKind::Movie => output.print_entities(&store.all_entities::<Movie>()?),
        MediaKind::TvSeries => output.print_entities(&store.all_entities::<TvSeries>()?),
        MediaKind::Anime => output.print_entities(&store.all_entities::<Anime>()?),
    }
    Ok(())
}

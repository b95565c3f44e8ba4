use clap::Args;

use cardwise_core::config::LoadOptions;
use cardwise_core::CardId;
use cardwise_db::SqlCardOwnershipRepository;

use crate::commands::{with_database, CommandResult, Completed};

#[derive(Debug, Clone, Args)]
pub struct CardLinkArgs {
    #[arg(long)]
    pub user_id: i64,
    #[arg(long)]
    pub card_id: i64,
    #[arg(long, help = "Deactivate the association instead of creating it")]
    pub unlink: bool,
}

pub fn run(options: LoadOptions, args: CardLinkArgs) -> CommandResult {
    with_database("cards", options, |_config, pool| async move {
        let repository = SqlCardOwnershipRepository::new(pool);
        let card_id = CardId(args.card_id);

        if args.unlink {
            let removed = repository
                .unlink_card(args.user_id, card_id)
                .await
                .map_err(|error| ("persistence", error.to_string(), 8u8))?;
            if !removed {
                return Err((
                    "not_found",
                    format!("user {} has no active link to card {card_id}", args.user_id),
                    7u8,
                ));
            }
        } else {
            repository
                .link_card(args.user_id, card_id)
                .await
                .map_err(|error| ("persistence", error.to_string(), 8u8))?;
        }

        let owned = repository
            .active_cards(args.user_id)
            .await
            .map_err(|error| ("persistence", error.to_string(), 8u8))?;
        Completed::with_data(
            format!("user {} holds {} active cards", args.user_id, owned.len()),
            owned.iter().map(|card| card.0).collect::<Vec<_>>(),
        )
    })
}

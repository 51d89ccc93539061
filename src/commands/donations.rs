//! `donations`: record donations, manage donation types, and show totals.
//!
//! Verb forms, checked in this order:
//!
//! | input                                     | action            |
//! |-------------------------------------------|-------------------|
//! | `list, all`                               | clan-wide totals  |
//! | `list, user, <player>`                    | one player's total|
//! | `list, type, <type>`                      | one type's total  |
//! | `add, type, <name>`                       | new donation type |
//! | `remove, type, <name>`                    | drop a type       |
//! | `add, <type>, <player>, <amount>`         | record a donation |
//! | `list, top, <type>`                       | leaderboard       |

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{help_embed, require, Command, CommandContext, CommandError};
use super::{RequiredField, WebRequest};
use crate::messages::{display_value, Embed};

const LIST_PATH: &str = "api/donations/list";
const ADD_DONATION_PATH: &str = "api/donations/add/donation";
const ADD_TYPE_PATH: &str = "api/donations/add/type";
const REMOVE_TYPE_PATH: &str = "api/donations/remove/type";
const TOP_DONATORS_PATH: &str = "api/donations/list/topDonators";

/// Discord caps an embed at 25 fields.
const MAX_EMBED_FIELDS: usize = 25;

const LIST_USER_FIELDS: &[RequiredField] = &[
    RequiredField::labeled("type", "Lookup type"),
    RequiredField::labeled("lookupId", "Username"),
];
const LIST_TYPE_FIELDS: &[RequiredField] = &[
    RequiredField::labeled("type", "Lookup type"),
    RequiredField::labeled("lookupId", "Donation type"),
];
const ADD_FIELDS: &[RequiredField] = &[
    RequiredField::labeled("donationType", "Donation type"),
    RequiredField::labeled("username", "Username"),
    RequiredField::labeled("amount", "Amount"),
];
const ADD_TYPE_FIELDS: &[RequiredField] = &[RequiredField::labeled("name", "New donation type")];
const REMOVE_TYPE_FIELDS: &[RequiredField] =
    &[RequiredField::labeled("name", "Donation type to remove")];
const TOP_FIELDS: &[RequiredField] = &[RequiredField::labeled("name", "Donation type")];

/// Parsed donations verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationAction {
    ListAll,
    ListUser,
    ListType,
    AddType,
    RemoveType,
    AddDonation,
    ListTop,
    Help,
}

impl DonationAction {
    pub fn from_tokens(verb: &str, sub_verb: Option<&str>) -> Self {
        match (verb, sub_verb) {
            ("list", Some("all")) => Self::ListAll,
            ("list", Some("user")) => Self::ListUser,
            ("list", Some("type")) => Self::ListType,
            ("add", Some("type")) => Self::AddType,
            ("remove", Some("type")) => Self::RemoveType,
            ("add", _) => Self::AddDonation,
            ("list", Some("top")) => Self::ListTop,
            _ => Self::Help,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationTypeTotal {
    pub name: String,
    #[serde(default)]
    pub formatted_amount: Value,
}

/// Response to `list, all`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanTotals {
    #[serde(default)]
    pub grand_total: Value,
    #[serde(default)]
    pub donation_types: Vec<DonationTypeTotal>,
}

/// A named total: one player, one donation type, or one leaderboard row.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedTotal {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationTypeName {
    pub name: String,
}

pub struct DonationsCommand;

pub fn render_clan_totals(totals: &ClanTotals) -> Embed {
    Embed::new()
        .title("Total donated")
        .field("Grand Total Donated", display_value(Some(&totals.grand_total)))
        .fields(
            totals
                .donation_types
                .iter()
                .map(|t| (t.name.clone(), display_value(Some(&t.formatted_amount)))),
        )
        .timestamped()
}

pub fn render_named_total(title: Option<&str>, total: &NamedTotal) -> Embed {
    let embed = match title {
        Some(title) => Embed::new().title(title),
        None => Embed::new(),
    };
    embed
        .field(
            format!("Grand Total Donated For {}", total.name),
            display_value(Some(&total.total)),
        )
        .timestamped()
}

pub fn render_leaderboard(donation_type: &str, ranking: &[NamedTotal]) -> Embed {
    Embed::new()
        .title(format!("{donation_type} current donation rankings!"))
        .fields(
            ranking
                .iter()
                .take(MAX_EMBED_FIELDS)
                .enumerate()
                .map(|(i, d)| (format!("{}. {}", i + 1, d.name), display_value(Some(&d.total)))),
        )
        .timestamped()
}

impl DonationsCommand {
    async fn list_all(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let request = WebRequest::new().field("type", "all");
        let totals: ClanTotals = ctx
            .backend()
            .post_json(LIST_PATH, &request, &ctx.auth())
            .await?;
        ctx.reply_embed(render_clan_totals(&totals)).await;
        Ok(())
    }

    async fn list_one(
        &self,
        ctx: &CommandContext,
        lookup_type: &str,
        required: &[RequiredField],
        title: Option<&str>,
    ) -> Result<(), CommandError> {
        let request = WebRequest::new()
            .field("type", lookup_type)
            .optional("lookupId", ctx.invocation.arg(2));
        require(&request, required)?;
        let total: NamedTotal = ctx
            .backend()
            .post_json(LIST_PATH, &request, &ctx.auth())
            .await?;
        ctx.reply_embed(render_named_total(title, &total)).await;
        Ok(())
    }

    async fn add_donation(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        let request = WebRequest::new()
            .optional("donationType", inv.arg(1))
            .optional("username", inv.arg(2))
            .optional("amount", inv.arg(3));
        require(&request, ADD_FIELDS)?;

        let added: NamedTotal = ctx
            .backend()
            .post_json(ADD_DONATION_PATH, &request, &ctx.auth())
            .await?;
        let embed = Embed::new()
            .title(format!(
                "Successfully added {} to {}",
                request.text("amount"),
                request.text("username")
            ))
            .field("Total donated", display_value(Some(&added.total)))
            .timestamped();
        ctx.reply_embed(embed).await;
        Ok(())
    }

    async fn add_type(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let request = WebRequest::new().optional("name", ctx.invocation.arg(2));
        require(&request, ADD_TYPE_FIELDS)?;
        let created: DonationTypeName = ctx
            .backend()
            .post_json(ADD_TYPE_PATH, &request, &ctx.auth())
            .await?;
        let embed = Embed::new()
            .title(format!("{} successfully added as a donation type!", created.name))
            .timestamped();
        ctx.reply_embed(embed).await;
        Ok(())
    }

    async fn remove_type(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let request = WebRequest::new().optional("name", ctx.invocation.arg(2));
        require(&request, REMOVE_TYPE_FIELDS)?;
        let removed = ctx
            .backend()
            .delete(REMOVE_TYPE_PATH, &request, &ctx.auth())
            .await?;
        let removed: DonationTypeName = serde_json::from_value(removed)
            .map_err(|e| CommandError::Unexpected(format!("invalid remove response: {e}")))?;
        let embed = Embed::new()
            .title(format!(
                "{} successfully removed from donation type list!",
                removed.name
            ))
            .timestamped();
        ctx.reply_embed(embed).await;
        Ok(())
    }

    async fn list_top(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let request = WebRequest::new().optional("name", ctx.invocation.arg(2));
        require(&request, TOP_FIELDS)?;
        let ranking: Vec<NamedTotal> = ctx
            .backend()
            .post_json(TOP_DONATORS_PATH, &request, &ctx.auth())
            .await?;
        ctx.reply_embed(render_leaderboard(&request.text("name"), &ranking))
            .await;
        Ok(())
    }
}

#[async_trait]
impl Command for DonationsCommand {
    fn name(&self) -> &'static str {
        "donations"
    }

    fn description(&self) -> &'static str {
        "Handles donation calls"
    }

    fn usage(&self) -> &'static str {
        "list, all"
    }

    fn help(&self, prefix: &str) -> Embed {
        let p = prefix;
        help_embed(
            "Track clan donations",
            format!("{p}donations command help"),
            &[
                ("add", format!("{p}donations add, <donation type>, <player>, <amount>")),
                ("list all", format!("{p}donations list, all")),
                ("list user", format!("{p}donations list, user, <player>")),
                ("list type", format!("{p}donations list, type, <donation type>")),
                ("list top", format!("{p}donations list, top, <donation type>")),
                ("add type", format!("{p}donations add, type, <new donation type>")),
                (
                    "remove type",
                    format!("{p}donations remove, type, <donation type to remove>"),
                ),
            ],
        )
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        match DonationAction::from_tokens(inv.verb(), inv.sub_verb()) {
            DonationAction::ListAll => self.list_all(ctx).await,
            DonationAction::ListUser => self.list_one(ctx, "user", LIST_USER_FIELDS, None).await,
            DonationAction::ListType => {
                self.list_one(ctx, "donationType", LIST_TYPE_FIELDS, Some("Total donated"))
                    .await
            }
            DonationAction::AddType => self.add_type(ctx).await,
            DonationAction::RemoveType => self.remove_type(ctx).await,
            DonationAction::AddDonation => self.add_donation(ctx).await,
            DonationAction::ListTop => self.list_top(ctx).await,
            DonationAction::Help => {
                ctx.reply_embed(self.help(ctx.prefix())).await;
                Ok(())
            }
        }
    }
}

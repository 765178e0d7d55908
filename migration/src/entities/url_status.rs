//! Destination check state, one row per short link

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "url_status")]
pub struct Model {
    /// 对应 short_links.short_code，随短链接级联删除
    #[sea_orm(primary_key, auto_increment = false)]
    pub url_id: String,
    pub last_checked_at: Option<DateTimeUtc>,
    /// 传输层失败（超时、DNS、拒绝连接）时为 NULL
    pub last_status_code: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    pub gone_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub archive_url: Option<String>,
    pub archive_checked_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::short_link::Entity",
        from = "Column::UrlId",
        to = "super::short_link::Column::ShortCode",
        on_delete = "Cascade"
    )]
    ShortLink,
}

impl Related<super::short_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShortLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

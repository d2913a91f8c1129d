pub mod health_dto;
pub mod playlist_dto;

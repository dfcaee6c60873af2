pub mod pyparamc_cli;

mod store_integration;

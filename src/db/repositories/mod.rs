mod readings;
